//! Asset Select CLI - query asset dependency graphs from the command line.
//!
//! Selection strings are parsed, formatted, explained, or resolved against a
//! graph snapshot stored as JSON, JSON lines, or YAML.

use std::path::PathBuf;
use std::process::ExitCode;

use asset_select::config::{CliConfig, ColorChoice, Overrides};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;

/// Asset Select: query language for asset dependency graphs.
#[derive(Parser)]
#[command(name = "asset-select")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./asset-select.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// When to use colors
    #[arg(long, value_enum, global = true)]
    color: Option<ColorChoice>,

    /// Let `*` and `not` range over source assets too
    #[arg(long, global = true, overrides_with = "no_include_sources")]
    include_sources: bool,

    /// Keep source assets out of `*` and `not`, whatever the config file says
    #[arg(long, global = true, overrides_with = "include_sources")]
    no_include_sources: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a selection against a graph snapshot
    Resolve {
        /// Selection string (e.g., "tag:pii and key:raw/orders+")
        selection: String,

        /// Graph snapshot (.json, .jsonl, .yaml or .yml)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Print keys as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the canonical form of a selection
    Fmt {
        /// Selection string
        selection: String,
    },

    /// Print the parse tree of a selection
    Tree {
        /// Selection string
        selection: String,
    },

    /// Validate a selection and point at the first error
    Check {
        /// Selection string
        selection: String,
    },
}

fn load_config(cli: &Cli) -> asset_select::Result<CliConfig> {
    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => {
            let cwd = std::env::current_dir().map_err(|source| asset_select::Error::Io {
                path: PathBuf::from("."),
                source,
            })?;
            CliConfig::discover(&cwd)?
        }
    };

    let graph = match &cli.command {
        Commands::Resolve { graph, .. } => graph.clone(),
        _ => None,
    };
    let include_sources = if cli.include_sources {
        Some(true)
    } else if cli.no_include_sources {
        Some(false)
    } else {
        None
    };
    Ok(config.with_overrides(Overrides {
        include_sources,
        graph,
        color: cli.color,
    }))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report(&anyhow::Error::new(e));
            return ExitCode::FAILURE;
        }
    };
    config.color.apply();

    let result = match &cli.command {
        Commands::Resolve {
            selection, json, ..
        } => commands::resolve::run(selection, &config, *json),
        Commands::Fmt { selection } => commands::fmt::run(selection, &config),
        Commands::Tree { selection } => commands::tree::run(selection),
        Commands::Check { selection } => commands::check::run(selection, &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &anyhow::Error) {
    eprintln!("{}: {error}", "error".red().bold());
    // Show cause chain for nested errors
    for cause in error.chain().skip(1) {
        eprintln!("  {}: {cause}", "caused by".dimmed());
    }
}
