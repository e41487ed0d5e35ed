//! `asset-select check` command implementation.

use anyhow::Result;
use asset_select::config::CliConfig;
use asset_select::render;
use colored::Colorize;

/// Run the check command.
///
/// Valid selections print their canonical form. Invalid ones print the
/// input with a caret under the offending position before the error is
/// returned.
pub fn run(selection: &str, config: &CliConfig) -> Result<()> {
    match asset_selection::parse_with(selection, config.parse_options()) {
        Ok(parsed) => {
            let canonical = parsed.to_selection_string()?;
            println!("{} {}", "valid".green().bold(), canonical);
            Ok(())
        }
        Err(e) => {
            if let Some(offset) = e.offset() {
                let diagnostic = render::caret_diagnostic(selection, offset);
                eprintln!("{}", diagnostic.red());
            }
            Err(e.into())
        }
    }
}
