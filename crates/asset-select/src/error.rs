//! Error types for loading configuration and graph snapshots.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the `asset-select` front end before any selection runs.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// The file being read
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: io::Error,
    },

    /// A JSON snapshot or JSONL line is malformed.
    #[error("invalid JSON in {}{}", .path.display(), .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    Json {
        /// The snapshot file
        path: PathBuf,
        /// 1-based line number for JSONL snapshots
        line: Option<usize>,
        /// The parse failure
        #[source]
        source: serde_json::Error,
    },

    /// A YAML snapshot or configuration file is malformed.
    #[error("invalid YAML in {}", .path.display())]
    Yaml {
        /// The file being parsed
        path: PathBuf,
        /// The parse failure
        #[source]
        source: serde_yaml::Error,
    },

    /// The snapshot's extension names no supported format.
    #[error("unsupported snapshot format for {}: expected .json, .jsonl, .yaml or .yml", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The snapshot's records do not form a valid graph.
    #[error("invalid asset graph in {}", .path.display())]
    Graph {
        /// The snapshot file
        path: PathBuf,
        /// What was wrong with the records
        #[source]
        source: asset_selection::GraphError,
    },

    /// A command needs a snapshot but none was given.
    #[error("no asset graph given: pass --graph or set 'graph' in the config file")]
    MissingGraph,
}

/// Result type for `asset-select` operations.
pub type Result<T> = std::result::Result<T, Error>;
