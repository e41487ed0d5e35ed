//! Output formatting for the `asset-select` commands.

use asset_selection::AssetKey;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Indent applied to echoed selection text.
const INDENT: &str = "  ";

/// Render the input with a caret under the character at byte `offset`.
///
/// ```
/// let rendered = asset_select::render::caret_diagnostic("key:a and", 9);
/// assert_eq!(rendered, "  key:a and\n           ^");
/// ```
#[must_use]
pub fn caret_diagnostic(input: &str, offset: usize) -> String {
    // Columns count characters, not bytes.
    let column = input
        .get(..offset)
        .map_or_else(|| input.chars().count(), |prefix| prefix.chars().count());
    format!("{INDENT}{input}\n{INDENT}{}^", " ".repeat(column))
}

/// Render resolved keys, one per line in sorted order.
#[must_use]
pub fn key_lines(keys: &BTreeSet<AssetKey>) -> String {
    let mut output = String::new();
    for key in keys {
        writeln!(output, "{key}").unwrap();
    }
    output
}

/// Render resolved keys as a JSON array of `/`-joined strings.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn key_json(keys: &BTreeSet<AssetKey>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(keys)
}
