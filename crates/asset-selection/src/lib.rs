//! # Asset Selection: a query language over asset dependency graphs
//!
//! Selection strings such as `tag:pii and 2+key:"raw/*"` are compiled into
//! an [`AssetSelection`] expression, which can be combined programmatically,
//! resolved against any [`AssetGraph`] into a set of [`AssetKey`]s, and
//! written back to a canonical string.
//!
//! ## Pipeline
//!
//! - **Lexer** ([`lexer`]) - winnow-based tokenizer with byte spans
//! - **Parser** ([`parser`]) - recursive descent into a concrete [`ParseTree`]
//! - **Visitor** ([`visitor`]) - parse tree to [`AssetSelection`], applying
//!   `<null>` and depth rules
//! - **Resolver** - [`AssetSelection::resolve`] against a graph provider
//! - **Serializer** - [`AssetSelection::to_selection_string`], the inverse of parsing
//!
//! ## Quick Start
//!
//! ```
//! use asset_selection::{AssetKey, AssetRecord, InMemoryAssetGraph};
//!
//! let graph = InMemoryAssetGraph::from_records([
//!     AssetRecord::new("a"),
//!     AssetRecord::new("b").with_deps(["a"]),
//!     AssetRecord::new("c").with_deps(["b"]),
//! ])?;
//!
//! let selection = asset_selection::parse("key:a+1")?;
//! let keys = selection.resolve(&graph)?;
//! assert_eq!(keys.into_iter().collect::<Vec<_>>(), [AssetKey::from("a"), AssetKey::from("b")]);
//!
//! assert_eq!(selection.to_selection_string()?, "key:a+1");
//! # Ok::<(), asset_selection::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod ast;
pub mod error;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod selection;
pub mod visitor;

mod key;
mod resolve;
mod serializer;

pub use ast::ParseTree;
pub use error::{
    Error, GraphError, LexError, ResolutionError, Result, SemanticError, SyntaxError,
};
pub use graph::{AssetGraph, AssetRecord, AttributeValue, ColumnRecord, InMemoryAssetGraph};
pub use key::{AssetKey, KEY_SEPARATOR};
pub use lexer::{Span, Token, TokenKind};
pub use selection::{AssetSelection, Attribute, Depth};
pub use visitor::{ParseOptions, SelectionVisitor};

/// Alias for [`Error`] under the name callers of the parse API expect.
pub type SelectionError = Error;

use std::str::FromStr;

use lexer::tokenize;
use parser::Parser;

/// Parse a selection string into its concrete tree.
///
/// # Errors
///
/// Returns [`Error::Lex`] or [`Error::Syntax`] if the string is malformed.
pub fn parse_tree(text: &str) -> Result<ParseTree> {
    let tokens = tokenize(text)?;
    tracing::trace!(tokens = tokens.len(), "Tokenized selection");
    Ok(Parser::new(tokens).parse()?)
}

/// Parse a selection string with default [`ParseOptions`].
///
/// # Errors
///
/// Returns a parse-time error ([`Error::is_parse_error`]) carrying the byte
/// offset of the offending input.
pub fn parse(text: &str) -> Result<AssetSelection> {
    parse_with(text, ParseOptions::default())
}

/// Parse a selection string.
///
/// # Errors
///
/// Returns a parse-time error ([`Error::is_parse_error`]) carrying the byte
/// offset of the offending input.
pub fn parse_with(text: &str, options: ParseOptions) -> Result<AssetSelection> {
    let tree = parse_tree(text)?;
    let selection = SelectionVisitor::new(options).visit(&tree)?;
    tracing::debug!(input = text, "Parsed selection");
    Ok(selection)
}

impl FromStr for AssetSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
