//! Concrete parse tree for selection strings.
//!
//! The tree mirrors the grammar productions one-to-one and keeps the raw
//! text of literals so it can be rendered back for diagnostics. It is
//! transient: the visitor turns it into an [`AssetSelection`] and the tree is
//! dropped.
//!
//! [`AssetSelection`]: crate::selection::AssetSelection

use std::fmt::Write;

use crate::lexer::{Span, Token};

/// Root of a parsed selection string (`start := expr EOF`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    /// The single top-level expression
    pub expr: Expr,
}

/// An expression production.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Bare `*`
    All {
        /// Position of the star
        span: Span,
    },
    /// `not expr`
    Not {
        /// The `not` keyword as written
        keyword: Token,
        /// The negated expression
        operand: Box<Expr>,
    },
    /// `expr and expr`
    And {
        /// Left operand
        left: Box<Expr>,
        /// The `and` keyword as written
        keyword: Token,
        /// Right operand
        right: Box<Expr>,
    },
    /// `expr or expr`
    Or {
        /// Left operand
        left: Box<Expr>,
        /// The `or` keyword as written
        keyword: Token,
        /// Right operand
        right: Box<Expr>,
    },
    /// A traversal-allowed expression with at least one `+` marker
    Traversal {
        /// `N+` prefix, if present
        up: Option<TraversalMarker>,
        /// The expression being traversed from
        operand: TraversalAllowedExpr,
        /// `+N` suffix, if present
        down: Option<TraversalMarker>,
    },
    /// A traversal-allowed expression without markers
    Leaf(TraversalAllowedExpr),
}

/// A `+` with optional depth digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalMarker {
    /// The digits, if a depth was written
    pub depth: Option<Token>,
    /// Position of the `+`
    pub plus: Span,
}

/// Expressions that traversal markers may attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalAllowedExpr {
    /// `( expr )`
    Parenthesized(Box<Expr>),
    /// `name:value` forms
    Attribute(AttributeExpr),
    /// `sinks(expr)` or `roots(expr)`
    FunctionCall {
        /// Which function
        name: FunctionName,
        /// The argument
        argument: Box<Expr>,
    },
}

/// Graph functions callable in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    /// `sinks(...)`
    Sinks,
    /// `roots(...)`
    Roots,
}

impl FunctionName {
    /// Look up a function by its exact name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sinks" => Some(Self::Sinks),
            "roots" => Some(Self::Roots),
            _ => None,
        }
    }

    /// The name as written in selection strings.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sinks => "sinks",
            Self::Roots => "roots",
        }
    }
}

/// Attribute names other than `key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeName {
    /// `tag`
    Tag,
    /// `owner`
    Owner,
    /// `group`
    Group,
    /// `kind`
    Kind,
    /// `code_location`
    CodeLocation,
    /// `status`
    Status,
    /// `column`
    Column,
    /// `table_name`
    TableName,
    /// `column_tag`
    ColumnTag,
    /// `changed_in_branch`
    ChangedInBranch,
}

impl AttributeName {
    /// Every attribute name, in grammar order.
    pub const ALL: [Self; 10] = [
        Self::Tag,
        Self::Owner,
        Self::Group,
        Self::Kind,
        Self::CodeLocation,
        Self::Status,
        Self::Column,
        Self::TableName,
        Self::ColumnTag,
        Self::ChangedInBranch,
    ];

    /// Look up an attribute by its exact name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.as_str() == name)
    }

    /// The name as written in selection strings.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Kind => "kind",
            Self::CodeLocation => "code_location",
            Self::Status => "status",
            Self::Column => "column",
            Self::TableName => "table_name",
            Self::ColumnTag => "column_tag",
            Self::ChangedInBranch => "changed_in_branch",
        }
    }
}

/// `key:value` or `name:value(=value)?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeExpr {
    /// `key:<keyValue>`
    Key(Value),
    /// `name:value` with an optional `=value`
    KeyValue {
        /// The attribute name
        name: AttributeName,
        /// The first value
        value: Value,
        /// The value after `=`, if any
        second: Option<Value>,
    },
}

/// A literal in value position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    /// The decoded literal
    pub literal: Literal,
    /// The text exactly as written
    pub raw: String,
    /// Where the literal appears
    pub span: Span,
}

/// Decoded literal forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Double-quoted string, escapes decoded
    Quoted(String),
    /// Unquoted word or number
    Bare(String),
    /// `<...>`; holds the text between the brackets
    Sentinel(String),
}

impl ParseTree {
    /// Render the tree in parenthesized form, one node per production.
    ///
    /// `key:a` renders as
    /// `(start (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) <EOF>)`.
    #[must_use]
    pub fn to_tree_string(&self) -> String {
        let mut output = String::from("(start ");
        write_expr(&mut output, &self.expr);
        output.push_str(" <EOF>)");
        output
    }
}

fn write_expr(output: &mut String, expr: &Expr) {
    output.push_str("(expr ");
    match expr {
        Expr::All { .. } => output.push('*'),
        Expr::Not { keyword, operand } => {
            output.push_str(&keyword.text);
            output.push(' ');
            write_expr(output, operand);
        }
        Expr::And {
            left,
            keyword,
            right,
        }
        | Expr::Or {
            left,
            keyword,
            right,
        } => {
            write_expr(output, left);
            write!(output, " {} ", keyword.text).unwrap();
            write_expr(output, right);
        }
        Expr::Traversal { up, operand, down } => {
            if let Some(marker) = up {
                output.push_str("(upTraversal ");
                if let Some(depth) = &marker.depth {
                    write!(output, "{} ", depth.text).unwrap();
                }
                output.push_str("+) ");
            }
            write_traversal_allowed(output, operand);
            if let Some(marker) = down {
                output.push_str(" (downTraversal +");
                if let Some(depth) = &marker.depth {
                    write!(output, " {}", depth.text).unwrap();
                }
                output.push(')');
            }
        }
        Expr::Leaf(operand) => write_traversal_allowed(output, operand),
    }
    output.push(')');
}

fn write_traversal_allowed(output: &mut String, expr: &TraversalAllowedExpr) {
    output.push_str("(traversalAllowedExpr ");
    match expr {
        TraversalAllowedExpr::Parenthesized(inner) => {
            output.push_str("( ");
            write_expr(output, inner);
            output.push_str(" )");
        }
        TraversalAllowedExpr::Attribute(attribute) => write_attribute(output, attribute),
        TraversalAllowedExpr::FunctionCall { name, argument } => {
            write!(output, "(functionName {}) ( ", name.as_str()).unwrap();
            write_expr(output, argument);
            output.push_str(" )");
        }
    }
    output.push(')');
}

fn write_attribute(output: &mut String, attribute: &AttributeExpr) {
    match attribute {
        AttributeExpr::Key(value) => {
            write!(output, "(attributeExpr key : (keyValue {}))", value.raw).unwrap();
        }
        AttributeExpr::KeyValue {
            name,
            value,
            second,
        } => {
            write!(output, "(attributeExpr {} : (value {})", name.as_str(), value.raw).unwrap();
            if let Some(second) = second {
                write!(output, " = (value {})", second.raw).unwrap();
            }
            output.push(')');
        }
    }
}
