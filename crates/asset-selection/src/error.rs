//! Error types for selection parsing and resolution.
//!
//! Errors fall into two groups:
//!
//! - **Parse-time errors** (`LexError`, `SyntaxError`, `SemanticError`): the
//!   selection string is malformed. They carry the byte offset of the
//!   offending input so callers can point at it.
//! - **Resolution errors** (`ResolutionError`): the graph provider handed back
//!   something inconsistent. They never occur against a well-formed graph.
//!
//! Nothing is recovered internally; every error reaches the caller.

use crate::key::AssetKey;
use thiserror::Error;

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for selection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The input contains a character no token rule accepts.
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    /// The token stream does not match the grammar.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// The input is grammatical but a literal is not allowed.
    #[error("invalid selection: {0}")]
    Semantic(#[from] SemanticError),

    /// The graph provider reported inconsistent data.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Building an in-memory graph failed.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The selection has no textual form.
    #[error("selection cannot be written as text: {0}")]
    Unrepresentable(String),
}

impl Error {
    /// Byte offset into the selection string where a parse-time error occurred.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Lex(e) => Some(e.offset()),
            Self::Syntax(e) => Some(e.position),
            Self::Semantic(e) => Some(e.offset()),
            Self::Resolution(_) | Self::Graph(_) | Self::Unrepresentable(_) => None,
        }
    }

    /// Returns `true` if the selection string itself was at fault.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Lex(_) | Self::Syntax(_) | Self::Semantic(_))
    }

    /// Returns `true` if the graph provider was at fault.
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }
}

/// Errors raised while splitting the input into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// No token rule matches at this position.
    #[error("unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter {
        /// The offending character
        character: char,
        /// Byte offset of the character
        offset: usize,
    },

    /// A quoted string runs to the end of the input.
    #[error("unterminated quoted string starting at offset {offset}")]
    UnterminatedQuote {
        /// Byte offset of the opening quote
        offset: usize,
    },
}

impl LexError {
    /// Byte offset of the failure.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { offset, .. } | Self::UnterminatedQuote { offset } => {
                *offset
            }
        }
    }
}

/// A grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected} at offset {position}, found {found}")]
pub struct SyntaxError {
    /// Byte offset of the unexpected token
    pub position: usize,
    /// What the grammar allows at this position
    pub expected: String,
    /// Description of the token actually found
    pub found: String,
}

impl SyntaxError {
    /// Create a syntax error.
    pub fn new(position: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// A grammatical literal that the selection model rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// A `<...>` literal other than `<null>`.
    #[error("unknown sentinel '<{spelling}>' at offset {offset}, only '<null>' is recognized")]
    UnknownSentinel {
        /// Text between the angle brackets
        spelling: String,
        /// Byte offset of the sentinel
        offset: usize,
    },

    /// A traversal depth that is zero, has a leading zero, or overflows.
    #[error("invalid traversal depth '{digits}' at offset {offset}: {reason}")]
    InvalidDepth {
        /// The digits as written
        digits: String,
        /// Byte offset of the digits
        offset: usize,
        /// Why the depth was rejected
        reason: &'static str,
    },

    /// `<null>` in a position that requires a concrete value.
    #[error("{position} does not accept <null> (offset {offset})")]
    NullNotAllowed {
        /// Which literal position rejected the sentinel
        position: &'static str,
        /// Byte offset of the sentinel
        offset: usize,
    },

    /// An `=value` part on an attribute that takes a single value.
    #[error("attribute '{attribute}' does not take an '=value' part (offset {offset})")]
    UnexpectedValue {
        /// The attribute name
        attribute: &'static str,
        /// Byte offset of the second value
        offset: usize,
    },
}

impl SemanticError {
    /// Byte offset of the rejected literal.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnknownSentinel { offset, .. }
            | Self::InvalidDepth { offset, .. }
            | Self::NullNotAllowed { offset, .. }
            | Self::UnexpectedValue { offset, .. } => *offset,
        }
    }
}

/// Faults in the data a graph provider returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// An edge points at a key the provider does not list.
    #[error("asset {from} has an edge to unknown asset {to}")]
    DanglingEdge {
        /// The asset whose neighbors were requested
        from: AssetKey,
        /// The unknown neighbor
        to: AssetKey,
    },

    /// A key wildcard could not be compiled into a matcher.
    #[error("invalid key pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The wildcard as written
        pattern: String,
        /// Matcher construction failure
        reason: String,
    },
}

/// Errors building an in-memory asset graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two records share a key.
    #[error("duplicate asset key: {0}")]
    DuplicateKey(AssetKey),

    /// A record depends on a key that no record defines.
    #[error("asset {asset} depends on unknown asset {dependency}")]
    UnknownDependency {
        /// The dependent asset
        asset: AssetKey,
        /// The missing dependency
        dependency: AssetKey,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_categorized() {
        let lex: Error = LexError::UnterminatedQuote { offset: 4 }.into();
        let syntax: Error = SyntaxError::new(0, "expression", "end of input").into();
        let resolution: Error = ResolutionError::DanglingEdge {
            from: AssetKey::from("a"),
            to: AssetKey::from("b"),
        }
        .into();

        assert!(lex.is_parse_error());
        assert!(syntax.is_parse_error());
        assert!(!resolution.is_parse_error());
        assert!(resolution.is_resolution_error());
    }

    #[test]
    fn offset_is_exposed_for_parse_errors() {
        let err: Error = SemanticError::UnknownSentinel {
            spelling: "none".to_string(),
            offset: 6,
        }
        .into();
        assert_eq!(err.offset(), Some(6));
        assert_eq!(Error::Unrepresentable("x".to_string()).offset(), None);
    }

    #[test]
    fn syntax_error_display_includes_context() {
        let err = SyntaxError::new(8, "value", "end of input");
        let display = err.to_string();
        assert!(display.contains("expected value"));
        assert!(display.contains("offset 8"));
        assert!(display.contains("end of input"));
    }
}
