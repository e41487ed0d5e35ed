//! `asset-select fmt` command implementation.

use anyhow::{Context, Result};
use asset_select::config::CliConfig;

/// Run the fmt command: print the canonical form of the selection.
pub fn run(selection: &str, config: &CliConfig) -> Result<()> {
    let parsed = asset_selection::parse_with(selection, config.parse_options())
        .with_context(|| format!("invalid selection {selection:?}"))?;
    println!("{}", parsed.to_selection_string()?);
    Ok(())
}
