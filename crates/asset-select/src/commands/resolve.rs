//! `asset-select resolve` command implementation.

use anyhow::{Context, Result};
use asset_select::config::CliConfig;
use asset_select::{Error, render, snapshot};

/// Run the resolve command.
pub fn run(selection: &str, config: &CliConfig, json: bool) -> Result<()> {
    let parsed = asset_selection::parse_with(selection, config.parse_options())
        .with_context(|| format!("invalid selection {selection:?}"))?;

    let path = config.graph.as_deref().ok_or(Error::MissingGraph)?;
    let graph = snapshot::load_graph(path)?;
    let keys = parsed
        .resolve(&graph)
        .with_context(|| format!("failed to resolve against {}", path.display()))?;

    tracing::info!(selected = keys.len(), assets = graph.len(), "Resolved selection");

    if json {
        println!("{}", render::key_json(&keys)?);
    } else {
        print!("{}", render::key_lines(&keys));
    }
    Ok(())
}
