//! Recursive-descent parser from tokens to a [`ParseTree`].
//!
//! Precedence, loosest first: `or`, `and`, `not`, traversal markers. `and`
//! and `or` are left-associative. Traversal markers attach to a single
//! traversal-allowed expression, so `key:a+ and key:b` groups as
//! `(key:a+) and key:b`.

use crate::ast::{
    AttributeExpr, AttributeName, Expr, FunctionName, Literal, ParseTree, TraversalAllowedExpr,
    TraversalMarker, Value,
};
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

/// The attribute name that takes a key wildcard instead of a value.
const KEY_ATTRIBUTE: &str = "key";

/// Deepest nesting of parentheses, function calls and `not` in one selection.
pub const MAX_NESTING: usize = 128;

/// Most operators and groupings in one selection. Bounds the depth of the
/// resulting tree, including left-deep `and`/`or` chains.
pub const MAX_OPERATORS: usize = 512;

/// Parser state over a token stream ending in [`TokenKind::Eof`].
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    /// Create a parser over tokens produced by [`tokenize`](crate::lexer::tokenize).
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            operators: 0,
        }
    }

    /// Parse `start := expr EOF`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] at the first token that does not fit the
    /// grammar, including any token left over after a complete expression.
    pub fn parse(mut self) -> Result<ParseTree, SyntaxError> {
        let expr = self.parse_or()?;
        if !matches!(self.peek().kind, TokenKind::Eof) {
            return Err(self.unexpected("'and', 'or' or end of input"));
        }
        Ok(ParseTree { expr })
    }

    fn peek(&self) -> &Token {
        // The stream always ends with Eof and the parser never advances past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.position + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.position += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.peek();
        SyntaxError::new(token.span.start, expected, token.describe())
    }

    /// Count one operator or grouping at the current token.
    fn count_operator(&mut self) -> Result<(), SyntaxError> {
        if self.operators == MAX_OPERATORS {
            return Err(self.unexpected("a shorter expression"));
        }
        self.operators += 1;
        Ok(())
    }

    /// Open a nesting level at the current token; pair with [`Self::leave`].
    fn enter(&mut self) -> Result<(), SyntaxError> {
        if self.depth == MAX_NESTING {
            return Err(self.unexpected("a less deeply nested expression"));
        }
        self.count_operator()?;
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, SyntaxError> {
        if &self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek().kind, TokenKind::Or) {
            self.count_operator()?;
            let keyword = self.advance();
            let right = self.parse_and()?;
            left = Expr::Or {
                left: Box::new(left),
                keyword,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        while matches!(self.peek().kind, TokenKind::And) {
            self.count_operator()?;
            let keyword = self.advance();
            let right = self.parse_unary()?;
            left = Expr::And {
                left: Box::new(left),
                keyword,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek().kind {
            TokenKind::Not => {
                self.enter()?;
                let keyword = self.advance();
                let operand = self.parse_unary()?;
                self.leave();
                Ok(Expr::Not {
                    keyword,
                    operand: Box::new(operand),
                })
            }
            TokenKind::Star => {
                let star = self.advance();
                Ok(Expr::All { span: star.span })
            }
            _ => self.parse_traversal(),
        }
    }

    fn parse_traversal(&mut self) -> Result<Expr, SyntaxError> {
        let up = self.parse_up_marker()?;
        let operand = self.parse_traversal_allowed()?;
        let down = self.parse_down_marker();

        if up.is_none() && down.is_none() {
            Ok(Expr::Leaf(operand))
        } else {
            self.count_operator()?;
            Ok(Expr::Traversal { up, operand, down })
        }
    }

    /// `DIGITS? '+'` before an operand.
    fn parse_up_marker(&mut self) -> Result<Option<TraversalMarker>, SyntaxError> {
        match self.peek().kind {
            TokenKind::Number(_) => {
                let depth = self.advance();
                let plus = self.expect(&TokenKind::Plus, "'+' after traversal depth")?;
                Ok(Some(TraversalMarker {
                    depth: Some(depth),
                    plus: plus.span,
                }))
            }
            TokenKind::Plus => {
                let plus = self.advance();
                Ok(Some(TraversalMarker {
                    depth: None,
                    plus: plus.span,
                }))
            }
            _ => Ok(None),
        }
    }

    /// `'+' DIGITS?` after an operand.
    fn parse_down_marker(&mut self) -> Option<TraversalMarker> {
        if !matches!(self.peek().kind, TokenKind::Plus) {
            return None;
        }
        let plus = self.advance();
        let depth = matches!(self.peek().kind, TokenKind::Number(_)).then(|| self.advance());
        Some(TraversalMarker {
            depth,
            plus: plus.span,
        })
    }

    fn parse_traversal_allowed(&mut self) -> Result<TraversalAllowedExpr, SyntaxError> {
        match &self.peek().kind {
            TokenKind::LeftParen => {
                self.enter()?;
                self.advance();
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RightParen, "')'")?;
                self.leave();
                Ok(TraversalAllowedExpr::Parenthesized(Box::new(inner)))
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                match self.peek_next().kind {
                    TokenKind::LeftParen => self.parse_function_call(&name),
                    TokenKind::Colon => self.parse_attribute(&name),
                    _ => {
                        self.advance();
                        Err(self.unexpected(&format!("':' or '(' after '{name}'")))
                    }
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> Result<TraversalAllowedExpr, SyntaxError> {
        let Some(function) = FunctionName::from_name(name) else {
            return Err(self.unexpected("function name 'sinks' or 'roots'"));
        };
        self.enter()?;
        self.advance();
        self.expect(&TokenKind::LeftParen, "'('")?;
        let argument = self.parse_or()?;
        self.expect(&TokenKind::RightParen, "')'")?;
        self.leave();
        Ok(TraversalAllowedExpr::FunctionCall {
            name: function,
            argument: Box::new(argument),
        })
    }

    fn parse_attribute(&mut self, name: &str) -> Result<TraversalAllowedExpr, SyntaxError> {
        if name == KEY_ATTRIBUTE {
            self.advance();
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.parse_key_value()?;
            return Ok(TraversalAllowedExpr::Attribute(AttributeExpr::Key(value)));
        }

        let Some(attribute) = AttributeName::from_name(name) else {
            return Err(self.unexpected(&attribute_name_list()));
        };
        self.advance();
        self.expect(&TokenKind::Colon, "':'")?;
        let value = self.parse_value()?;
        let second = if matches!(self.peek().kind, TokenKind::Equal) {
            self.advance();
            Some(self.parse_value()?)
        } else {
            None
        };

        Ok(TraversalAllowedExpr::Attribute(AttributeExpr::KeyValue {
            name: attribute,
            value,
            second,
        }))
    }

    /// `keyValue := QUOTED | WORD`; `/` is allowed in bare keys.
    fn parse_key_value(&mut self) -> Result<Value, SyntaxError> {
        let literal = match &self.peek().kind {
            TokenKind::Quoted(text) => Literal::Quoted(text.clone()),
            TokenKind::Identifier(text) | TokenKind::Number(text) => Literal::Bare(text.clone()),
            _ => return Err(self.unexpected("a key (bare word or quoted string)")),
        };
        Ok(self.literal_value(literal))
    }

    /// `value := QUOTED | IDENT | DIGITS | SENTINEL`; no `/` in bare values.
    fn parse_value(&mut self) -> Result<Value, SyntaxError> {
        let literal = match &self.peek().kind {
            TokenKind::Quoted(text) => Literal::Quoted(text.clone()),
            TokenKind::Identifier(text) if text.contains('/') => {
                return Err(self.unexpected("a value ('/' requires quotes)"));
            }
            TokenKind::Identifier(text) | TokenKind::Number(text) => Literal::Bare(text.clone()),
            TokenKind::Sentinel(text) => Literal::Sentinel(text.clone()),
            _ => return Err(self.unexpected("a value (bare word, quoted string or <null>)")),
        };
        Ok(self.literal_value(literal))
    }

    fn literal_value(&mut self, literal: Literal) -> Value {
        let token = self.advance();
        Value {
            literal,
            raw: token.text,
            span: token.span,
        }
    }
}

fn attribute_name_list() -> String {
    let names: Vec<&str> = std::iter::once(KEY_ATTRIBUTE)
        .chain(AttributeName::ALL.iter().map(|a| a.as_str()))
        .collect();
    format!("attribute name (one of {})", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use rstest::rstest;

    fn parse(source: &str) -> Result<ParseTree, SyntaxError> {
        Parser::new(tokenize(source).expect("input should lex")).parse()
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let tree = parse("key:a or key:b and key:c").unwrap();
        let Expr::Or { right, .. } = tree.expr else {
            panic!("expected or at the root");
        };
        assert!(matches!(*right, Expr::And { .. }));
    }

    #[test]
    fn and_is_left_associative() {
        let tree = parse("key:a and key:b and key:c").unwrap();
        let Expr::And { left, right, .. } = tree.expr else {
            panic!("expected and at the root");
        };
        assert!(matches!(*left, Expr::And { .. }));
        assert!(matches!(*right, Expr::Leaf(_)));
    }

    #[test]
    fn not_binds_tighter_than_and() {
        let tree = parse("not key:a and key:b").unwrap();
        let Expr::And { left, .. } = tree.expr else {
            panic!("expected and at the root");
        };
        assert!(matches!(*left, Expr::Not { .. }));
    }

    #[test]
    fn traversal_attaches_to_single_operand() {
        let tree = parse("key:a+ and +key:b").unwrap();
        let Expr::And { left, right, .. } = tree.expr else {
            panic!("expected and at the root");
        };
        assert!(matches!(*left, Expr::Traversal { up: None, down: Some(_), .. }));
        assert!(matches!(*right, Expr::Traversal { up: Some(_), down: None, .. }));
    }

    #[test]
    fn traversal_depths_keep_their_digits() {
        let tree = parse("2+key:a+10").unwrap();
        let Expr::Traversal {
            up: Some(up),
            down: Some(down),
            ..
        } = tree.expr
        else {
            panic!("expected traversal");
        };
        assert_eq!(up.depth.map(|t| t.text).as_deref(), Some("2"));
        assert_eq!(down.depth.map(|t| t.text).as_deref(), Some("10"));
    }

    #[rstest]
    #[case::star("*", "(start (expr *) <EOF>)")]
    #[case::key(
        "key:a",
        "(start (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) <EOF>)"
    )]
    #[case::quoted_key(
        r#"key:"*/a+""#,
        r#"(start (expr (traversalAllowedExpr (attributeExpr key : (keyValue "*/a+")))) <EOF>)"#
    )]
    #[case::sinks(
        "sinks(key:a)",
        "(start (expr (traversalAllowedExpr (functionName sinks) ( (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) ))) <EOF>)"
    )]
    #[case::roots(
        "roots(key:a)",
        "(start (expr (traversalAllowedExpr (functionName roots) ( (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) ))) <EOF>)"
    )]
    #[case::tag(
        "tag:foo=bar",
        "(start (expr (traversalAllowedExpr (attributeExpr tag : (value foo) = (value bar)))) <EOF>)"
    )]
    #[case::quoted_owner(
        r#"owner:"owner@owner.com""#,
        r#"(start (expr (traversalAllowedExpr (attributeExpr owner : (value "owner@owner.com")))) <EOF>)"#
    )]
    #[case::null_owner(
        "owner:<null>",
        "(start (expr (traversalAllowedExpr (attributeExpr owner : (value <null>)))) <EOF>)"
    )]
    #[case::nested_parens(
        "(((key:a)))",
        "(start (expr (traversalAllowedExpr ( (expr (traversalAllowedExpr ( (expr (traversalAllowedExpr ( (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) ))) ))) ))) <EOF>)"
    )]
    #[case::not(
        "not key:a",
        "(start (expr not (expr (traversalAllowedExpr (attributeExpr key : (keyValue a))))) <EOF>)"
    )]
    #[case::and(
        "key:a and key:b",
        "(start (expr (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) and (expr (traversalAllowedExpr (attributeExpr key : (keyValue b))))) <EOF>)"
    )]
    #[case::or(
        "key:a or key:b",
        "(start (expr (expr (traversalAllowedExpr (attributeExpr key : (keyValue a)))) or (expr (traversalAllowedExpr (attributeExpr key : (keyValue b))))) <EOF>)"
    )]
    #[case::traversal(
        "2+key:a+",
        "(start (expr (upTraversal 2 +) (traversalAllowedExpr (attributeExpr key : (keyValue a))) (downTraversal +)) <EOF>)"
    )]
    fn renders_tree(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(parse(source).unwrap().to_tree_string(), expected);
    }

    #[rstest]
    #[case::lone_plus("+", 1, "an expression")]
    #[case::star_with_traversal("*+", 1, "'and', 'or' or end of input")]
    #[case::double_star("**key:a", 1, "'and', 'or' or end of input")]
    #[case::dangling_not("not", 3, "an expression")]
    #[case::implicit_concatenation("key:a key:b", 6, "'and', 'or' or end of input")]
    #[case::double_and("key:a and and", 10, "an expression")]
    #[case::trailing_and("key:a and", 9, "an expression")]
    #[case::function_without_call("sinks", 5, "':' or '('")]
    #[case::attribute_without_value("owner", 5, "':' or '('")]
    #[case::missing_tag_value("tag:foo=", 8, "a value")]
    #[case::sentinel_key("key:<fake>", 4, "a key")]
    #[case::unknown_attribute("color:red", 0, "attribute name")]
    #[case::unknown_function("leaves(key:a)", 0, "function name")]
    #[case::unclosed_paren("(key:a", 6, "')'")]
    #[case::extra_close_paren("key:a)", 5, "end of input")]
    #[case::depth_without_plus("2 key:a", 2, "'+' after traversal depth")]
    #[case::digit_prefixed_word("2key:a", 0, "attribute name")]
    #[case::slash_in_owner("owner:a/b", 6, "'/' requires quotes")]
    fn rejects_invalid_input(
        #[case] source: &str,
        #[case] position: usize,
        #[case] expected_fragment: &str,
    ) {
        let err = parse(source).unwrap_err();
        assert_eq!(err.position, position, "wrong position for {source:?}: {err}");
        assert!(
            err.expected.contains(expected_fragment),
            "expected {expected_fragment:?} in {:?}",
            err.expected
        );
    }
}
