//! `asset-select tree` command implementation.

use anyhow::{Context, Result};

/// Run the tree command: print the concrete parse tree.
pub fn run(selection: &str) -> Result<()> {
    let tree = asset_selection::parse_tree(selection)
        .with_context(|| format!("invalid selection {selection:?}"))?;
    println!("{}", tree.to_tree_string());
    Ok(())
}
