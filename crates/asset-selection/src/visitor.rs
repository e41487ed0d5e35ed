//! Transform from [`ParseTree`] to [`AssetSelection`].
//!
//! The visitor is a single deterministic pass. It owns every decision the
//! grammar leaves open: what `<null>` means in each position, how depth
//! digits become numbers, and what `not` and `*` are relative to.

use crate::ast::{
    AttributeExpr, AttributeName, Expr, FunctionName, Literal, ParseTree, TraversalAllowedExpr,
    TraversalMarker, Value,
};
use crate::error::SemanticError;
use crate::selection::{AssetSelection, Attribute};

/// The only sentinel spelling the language accepts.
const NULL_SENTINEL: &str = "null";

/// Options that change how a selection string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Whether `*` and `not` range over source assets too
    pub include_sources: bool,
}

impl ParseOptions {
    /// Set whether `*` and `not` include source assets.
    #[must_use]
    pub fn with_include_sources(mut self, include_sources: bool) -> Self {
        self.include_sources = include_sources;
        self
    }
}

/// Builds an [`AssetSelection`] from a parse tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionVisitor {
    options: ParseOptions,
}

impl SelectionVisitor {
    /// Create a visitor with the given options.
    #[must_use]
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Convert `tree` into a selection.
    ///
    /// # Errors
    ///
    /// Returns a [`SemanticError`] for unknown sentinels, invalid depths,
    /// `<null>` where a concrete value is required, and `=value` parts on
    /// attributes that take a single value.
    pub fn visit(&self, tree: &ParseTree) -> Result<AssetSelection, SemanticError> {
        let selection = self.visit_expr(&tree.expr)?;
        tracing::trace!(?selection, "Visited parse tree");
        Ok(selection)
    }

    fn all(&self) -> AssetSelection {
        AssetSelection::all(self.options.include_sources)
    }

    fn visit_expr(&self, expr: &Expr) -> Result<AssetSelection, SemanticError> {
        match expr {
            Expr::All { .. } => Ok(self.all()),
            Expr::Not { operand, .. } => Ok(self.all().minus(self.visit_expr(operand)?)),
            Expr::And { left, right, .. } => {
                Ok(self.visit_expr(left)?.and(self.visit_expr(right)?))
            }
            Expr::Or { left, right, .. } => Ok(self.visit_expr(left)?.or(self.visit_expr(right)?)),
            Expr::Traversal { up, operand, down } => {
                let inner = self.visit_allowed(operand)?;
                let up = up.as_ref().map(parse_depth).transpose()?;
                let down = down.as_ref().map(parse_depth).transpose()?;
                Ok(match (up, down) {
                    (Some(up), Some(down)) => inner.clone().upstream(up).or(inner.downstream(down)),
                    (Some(up), None) => inner.upstream(up),
                    (None, Some(down)) => inner.downstream(down),
                    (None, None) => inner,
                })
            }
            Expr::Leaf(operand) => self.visit_allowed(operand),
        }
    }

    fn visit_allowed(&self, expr: &TraversalAllowedExpr) -> Result<AssetSelection, SemanticError> {
        match expr {
            TraversalAllowedExpr::Parenthesized(inner) => self.visit_expr(inner),
            TraversalAllowedExpr::Attribute(attribute) => visit_attribute(attribute),
            TraversalAllowedExpr::FunctionCall { name, argument } => {
                let argument = self.visit_expr(argument)?;
                Ok(match name {
                    FunctionName::Sinks => argument.sinks(),
                    FunctionName::Roots => argument.roots(),
                })
            }
        }
    }
}

/// Depth of a traversal marker; `None` when no digits were written.
fn parse_depth(marker: &TraversalMarker) -> Result<Option<u32>, SemanticError> {
    let Some(token) = &marker.depth else {
        return Ok(None);
    };
    let digits = token.text.as_str();
    let invalid = |reason| SemanticError::InvalidDepth {
        digits: digits.to_string(),
        offset: token.span.start,
        reason,
    };

    if digits.bytes().all(|b| b == b'0') {
        return Err(invalid("depth must be at least 1"));
    }
    if digits.starts_with('0') {
        return Err(invalid("leading zeros are not allowed"));
    }
    digits
        .parse::<u32>()
        .map(Some)
        .map_err(|_| invalid("depth is too large"))
}

/// The value's string, or `None` for `<null>`.
fn string_or_null(value: &Value) -> Result<Option<String>, SemanticError> {
    match &value.literal {
        Literal::Quoted(text) | Literal::Bare(text) => Ok(Some(text.clone())),
        Literal::Sentinel(spelling) if spelling == NULL_SENTINEL => Ok(None),
        Literal::Sentinel(spelling) => Err(SemanticError::UnknownSentinel {
            spelling: spelling.clone(),
            offset: value.span.start,
        }),
    }
}

fn required(value: &Value, position: &'static str) -> Result<String, SemanticError> {
    string_or_null(value)?.ok_or(SemanticError::NullNotAllowed {
        position,
        offset: value.span.start,
    })
}

fn visit_attribute(attribute: &AttributeExpr) -> Result<AssetSelection, SemanticError> {
    let (name, value, second) = match attribute {
        AttributeExpr::Key(value) => {
            return Ok(AssetSelection::key_wildcard(required(value, "key")?));
        }
        AttributeExpr::KeyValue {
            name,
            value,
            second,
        } => (*name, value, second.as_ref()),
    };

    let single = |attribute: Attribute| -> Result<AssetSelection, SemanticError> {
        reject_second(name, second)?;
        Ok(AssetSelection::Attribute {
            attribute,
            value: string_or_null(value)?,
        })
    };

    match name {
        AttributeName::Status => {
            reject_second(name, second)?;
            Ok(AssetSelection::status(required(value, "status")?))
        }
        AttributeName::Owner => single(Attribute::Owner),
        AttributeName::Group => single(Attribute::Group),
        AttributeName::Kind => single(Attribute::Kind),
        AttributeName::CodeLocation => single(Attribute::CodeLocation),
        AttributeName::Column => single(Attribute::Column),
        AttributeName::TableName => single(Attribute::TableName),
        AttributeName::ChangedInBranch => single(Attribute::ChangedInBranch),
        AttributeName::Tag => {
            let key = required(value, "tag name")?;
            let tag_value = match second {
                Some(second) => string_or_null(second)?,
                None => Some(String::new()),
            };
            Ok(AssetSelection::tag(key, tag_value.as_deref()))
        }
        AttributeName::ColumnTag => {
            let key = required(value, "column tag name")?;
            let tag_value = match second {
                Some(second) => string_or_null(second)?.unwrap_or_default(),
                None => String::new(),
            };
            Ok(AssetSelection::column_tag(key, tag_value))
        }
    }
}

fn reject_second(name: AttributeName, second: Option<&Value>) -> Result<(), SemanticError> {
    match second {
        Some(second) => Err(SemanticError::UnexpectedValue {
            attribute: name.as_str(),
            offset: second.span.start,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn visit(source: &str) -> Result<AssetSelection, SemanticError> {
        let tree = Parser::new(tokenize(source).unwrap()).parse().unwrap();
        SelectionVisitor::default().visit(&tree)
    }

    #[rstest]
    #[case::key("key:a", AssetSelection::key_wildcard("a"))]
    #[case::quoted_key(r#"key:"raw/*""#, AssetSelection::key_wildcard("raw/*"))]
    #[case::tag_without_value("tag:foo", AssetSelection::tag("foo", Some("")))]
    #[case::tag_with_value("tag:foo=bar", AssetSelection::tag("foo", Some("bar")))]
    #[case::tag_null_value("tag:foo=<null>", AssetSelection::tag("foo", None))]
    #[case::owner_null("owner:<null>", AssetSelection::owner(None))]
    #[case::group_null("group:<null>", AssetSelection::group(None))]
    #[case::status("status:HEALTHY", AssetSelection::status("HEALTHY"))]
    #[case::column_tag("column_tag:pii=true", AssetSelection::column_tag("pii", "true"))]
    #[case::column_tag_bare("column_tag:pii", AssetSelection::column_tag("pii", ""))]
    #[case::column_tag_null("column_tag:pii=<null>", AssetSelection::column_tag("pii", ""))]
    #[case::numeric_value("kind:3", AssetSelection::kind(Some("3")))]
    #[case::not("not key:a", AssetSelection::all(false).minus(AssetSelection::key_wildcard("a")))]
    #[case::star("*", AssetSelection::all(false))]
    #[case::up_and_down(
        "2+key:a+",
        AssetSelection::key_wildcard("a")
            .upstream(Some(2))
            .or(AssetSelection::key_wildcard("a").downstream(None))
    )]
    #[case::roots("roots(key:a)", AssetSelection::key_wildcard("a").roots())]
    #[case::parenthesized_traversal(
        "(key:a or key:b)+1",
        AssetSelection::key_wildcard("a")
            .or(AssetSelection::key_wildcard("b"))
            .downstream(Some(1))
    )]
    fn builds_selection(#[case] source: &str, #[case] expected: AssetSelection) {
        assert_eq!(visit(source).unwrap(), expected);
    }

    #[test]
    fn include_sources_applies_to_not_and_star() {
        let tree = Parser::new(tokenize("not *").unwrap()).parse().unwrap();
        let visitor = SelectionVisitor::new(ParseOptions::default().with_include_sources(true));
        assert_eq!(
            visitor.visit(&tree).unwrap(),
            AssetSelection::all(true).minus(AssetSelection::all(true))
        );
    }

    #[rstest]
    #[case::zero("0+key:a", 0)]
    #[case::leading_zero("key:a+01", 6)]
    #[case::overflow("99999999999+key:a", 0)]
    fn rejects_invalid_depths(#[case] source: &str, #[case] offset: usize) {
        let err = visit(source).unwrap_err();
        assert!(matches!(err, SemanticError::InvalidDepth { .. }), "{err}");
        assert_eq!(err.offset(), offset);
    }

    #[rstest]
    #[case::unknown_sentinel("owner:<none>", 6)]
    #[case::unknown_sentinel_in_tag_value("tag:a=<NULL>", 6)]
    fn rejects_unknown_sentinels(#[case] source: &str, #[case] offset: usize) {
        let err = visit(source).unwrap_err();
        assert!(matches!(err, SemanticError::UnknownSentinel { .. }), "{err}");
        assert_eq!(err.offset(), offset);
    }

    #[rstest]
    #[case::status("status:<null>")]
    #[case::tag_name("tag:<null>")]
    #[case::column_tag_name("column_tag:<null>=x")]
    fn rejects_null_where_required(#[case] source: &str) {
        assert!(matches!(
            visit(source),
            Err(SemanticError::NullNotAllowed { .. })
        ));
    }

    #[test]
    fn rejects_second_value_on_single_valued_attribute() {
        let err = visit("owner:a=b").unwrap_err();
        assert_eq!(
            err,
            SemanticError::UnexpectedValue {
                attribute: "owner",
                offset: 8,
            }
        );
    }
}
