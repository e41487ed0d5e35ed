//! Canonical text form of a selection.
//!
//! The output re-parses, with the same `include_sources` option, to a
//! structurally equal selection. Parentheses are emitted only where the
//! grammar needs them.

use std::fmt::Write;

use crate::error::{Error, Result};
use crate::key::KEY_SEPARATOR;
use crate::selection::{AssetSelection, Attribute, Depth};

/// Words that would lex as keywords if written bare.
const KEYWORDS: [&str; 3] = ["and", "or", "not"];

/// Binding strength of each selection form, loosest first.
const OR: u8 = 1;
const AND: u8 = 2;
const NOT: u8 = 3;
const ATOM: u8 = 4;

impl AssetSelection {
    /// Render the selection in the selection-string language.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] for forms the language has no
    /// syntax for: a `Minus` whose left side is not `All`, a traversal of
    /// depth zero, a `<null>` status, and a `<null>` column tag value.
    pub fn to_selection_string(&self) -> Result<String> {
        let mut output = String::new();
        write_selection(&mut output, self)?;
        Ok(output)
    }
}

/// `Or(Upstream(x, u), Downstream(x, d))`, written back as `u+ x +d`.
fn combined_traversal(selection: &AssetSelection) -> Option<(&AssetSelection, Depth, Depth)> {
    let AssetSelection::Or { left, right } = selection else {
        return None;
    };
    match (left.as_ref(), right.as_ref()) {
        (
            AssetSelection::Upstream {
                selection: up,
                depth: up_depth,
            },
            AssetSelection::Downstream {
                selection: down,
                depth: down_depth,
            },
        ) if up == down => Some((up, *up_depth, *down_depth)),
        _ => None,
    }
}

fn precedence(selection: &AssetSelection) -> u8 {
    match selection {
        AssetSelection::Or { .. } if combined_traversal(selection).is_some() => ATOM,
        AssetSelection::Or { .. } => OR,
        AssetSelection::And { .. } => AND,
        AssetSelection::Minus { .. } => NOT,
        _ => ATOM,
    }
}

/// Forms the grammar accepts directly next to a `+` marker.
fn is_traversal_allowed(selection: &AssetSelection) -> bool {
    matches!(
        selection,
        AssetSelection::KeyWildcard { .. }
            | AssetSelection::Attribute { .. }
            | AssetSelection::Sinks { .. }
            | AssetSelection::Roots { .. }
    )
}

fn write_selection(output: &mut String, selection: &AssetSelection) -> Result<()> {
    if let Some((inner, up, down)) = combined_traversal(selection) {
        write_depth(output, up)?;
        output.push('+');
        write_traversal_operand(output, inner)?;
        output.push('+');
        return write_depth(output, down);
    }

    match selection {
        AssetSelection::All { .. } => output.push('*'),
        AssetSelection::KeyWildcard { pattern } => {
            output.push_str("key:");
            write_value(output, pattern, true);
        }
        AssetSelection::Attribute { attribute, value } => {
            write_attribute(output, attribute, value.as_deref())?;
        }
        AssetSelection::Or { left, right } => {
            write_operand(output, left, OR)?;
            output.push_str(" or ");
            write_operand(output, right, OR + 1)?;
        }
        AssetSelection::And { left, right } => {
            write_operand(output, left, AND)?;
            output.push_str(" and ");
            write_operand(output, right, AND + 1)?;
        }
        AssetSelection::Minus { left, right } => {
            if !matches!(left.as_ref(), AssetSelection::All { .. }) {
                return Err(Error::Unrepresentable(
                    "difference whose left side is not all assets".to_string(),
                ));
            }
            output.push_str("not ");
            write_operand(output, right, NOT)?;
        }
        AssetSelection::Upstream { selection, depth } => {
            write_depth(output, *depth)?;
            output.push('+');
            write_traversal_operand(output, selection)?;
        }
        AssetSelection::Downstream { selection, depth } => {
            write_traversal_operand(output, selection)?;
            output.push('+');
            write_depth(output, *depth)?;
        }
        AssetSelection::Sinks { selection } => write_call(output, "sinks", selection)?,
        AssetSelection::Roots { selection } => write_call(output, "roots", selection)?,
    }
    Ok(())
}

fn write_operand(output: &mut String, selection: &AssetSelection, min: u8) -> Result<()> {
    if precedence(selection) < min {
        write_parenthesized(output, selection)
    } else {
        write_selection(output, selection)
    }
}

fn write_traversal_operand(output: &mut String, selection: &AssetSelection) -> Result<()> {
    if is_traversal_allowed(selection) {
        write_selection(output, selection)
    } else {
        write_parenthesized(output, selection)
    }
}

fn write_parenthesized(output: &mut String, selection: &AssetSelection) -> Result<()> {
    output.push('(');
    write_selection(output, selection)?;
    output.push(')');
    Ok(())
}

fn write_call(output: &mut String, name: &str, argument: &AssetSelection) -> Result<()> {
    write!(output, "{name}(").unwrap();
    write_selection(output, argument)?;
    output.push(')');
    Ok(())
}

fn write_depth(output: &mut String, depth: Depth) -> Result<()> {
    match depth {
        Depth::Bounded(0) => Err(Error::Unrepresentable(
            "traversal of depth 0".to_string(),
        )),
        Depth::Bounded(hops) => {
            write!(output, "{hops}").unwrap();
            Ok(())
        }
        Depth::Unbounded => Ok(()),
    }
}

fn write_attribute(output: &mut String, attribute: &Attribute, value: Option<&str>) -> Result<()> {
    write!(output, "{}:", attribute.name()).unwrap();
    match (attribute, value) {
        (Attribute::Tag(key) | Attribute::ColumnTag(key), Some("")) => {
            write_value(output, key, false);
        }
        (Attribute::Tag(key) | Attribute::ColumnTag(key), Some(value)) => {
            write_value(output, key, false);
            output.push('=');
            write_value(output, value, false);
        }
        (Attribute::Tag(key), None) => {
            write_value(output, key, false);
            output.push_str("=<null>");
        }
        (Attribute::ColumnTag(_), None) => {
            return Err(Error::Unrepresentable(
                "column tag without a value".to_string(),
            ));
        }
        (Attribute::Status, None) => {
            return Err(Error::Unrepresentable("status without a value".to_string()));
        }
        (_, Some(value)) => write_value(output, value, false),
        (_, None) => output.push_str("<null>"),
    }
    Ok(())
}

/// Write `value` bare when it lexes back as the same single word, quoted otherwise.
fn write_value(output: &mut String, value: &str, is_key: bool) {
    let bare_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || (is_key && c == KEY_SEPARATOR);
    let is_keyword = KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(value));

    if !value.is_empty() && value.chars().all(bare_char) && !is_keyword {
        output.push_str(value);
        return;
    }

    output.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            output.push('\\');
        }
        output.push(c);
    }
    output.push('"');
}
