//! Configuration for the `asset-select` binary.
//!
//! Settings come from three layers, highest priority first: command-line
//! flags, an `asset-select.yaml` file, and built-in defaults.
//!
//! ```yaml
//! include-sources: true
//! graph: snapshots/assets.jsonl
//! color: never
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "asset-select.yaml";

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when the output supports it
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl ColorChoice {
    /// Apply this choice to the global `colored` state.
    pub fn apply(self) {
        match self {
            Self::Auto => colored::control::unset_override(),
            Self::Always => colored::control::set_override(true),
            Self::Never => colored::control::set_override(false),
        }
    }
}

/// Contents of `asset-select.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CliConfig {
    /// Whether `*` and `not` include source assets
    #[serde(default)]
    pub include_sources: bool,

    /// Default snapshot for `resolve`, relative to the config file
    #[serde(default)]
    pub graph: Option<PathBuf>,

    /// Color mode
    #[serde(default)]
    pub color: ColorChoice,
}

/// Values given on the command line; `None` defers to the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `--include-sources` or `--no-include-sources`
    pub include_sources: Option<bool>,
    /// `--graph`
    pub graph: Option<PathBuf>,
    /// `--color`
    pub color: Option<ColorChoice>,
}

impl CliConfig {
    /// Load configuration from a file.
    ///
    /// A relative `graph` path is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and [`Error::Yaml`]
    /// if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        if let (Some(graph), Some(dir)) = (&config.graph, path.parent())
            && graph.is_relative()
        {
            config.graph = Some(dir.join(graph));
        }

        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Load `asset-select.yaml` from `dir`, or defaults if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::trace!(dir = %dir.display(), "No configuration file found");
            Ok(Self::default())
        }
    }

    /// Layer command-line values over this configuration.
    #[must_use]
    pub fn with_overrides(self, overrides: Overrides) -> Self {
        Self {
            include_sources: overrides.include_sources.unwrap_or(self.include_sources),
            graph: overrides.graph.or(self.graph),
            color: overrides.color.unwrap_or(self.color),
        }
    }

    /// Parse options for selection strings.
    #[must_use]
    pub fn parse_options(&self) -> asset_selection::ParseOptions {
        asset_selection::ParseOptions::default().with_include_sources(self.include_sources)
    }
}
