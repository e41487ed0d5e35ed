//! Tokenizer for selection strings using winnow.

use winnow::{
    combinator::{alt, delimited, preceded, repeat},
    prelude::*,
    token::{none_of, one_of, take_while},
};

use crate::error::LexError;

/// Byte range of a token in the selection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Offset of the first byte
    pub start: usize,
    /// Offset one past the last byte
    pub end: usize,
}

impl Span {
    /// Create a span covering `start..end`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The category of a token, with its decoded content where it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word such as `key`, `my_group` or `prefix/thing`
    Identifier(String),
    /// Run of ASCII digits
    Number(String),
    /// Double-quoted string, escapes already decoded
    Quoted(String),
    /// `<...>` literal; holds the text between the brackets
    Sentinel(String),
    /// `and`, any case
    And,
    /// `or`, any case
    Or,
    /// `not`, any case
    Not,
    /// `*`
    Star,
    /// `:`
    Colon,
    /// `=`
    Equal,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `+`
    Plus,
    /// End of input
    Eof,
}

/// A token with its raw source text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What the token is
    pub kind: TokenKind,
    /// The text exactly as it appears in the input
    pub text: String,
    /// Where the token appears in the input
    pub span: Span,
}

impl Token {
    fn eof(offset: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::new(offset, offset),
        }
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Characters allowed in an unquoted word.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '/'
}

/// Split a selection string into tokens, ending with [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns a [`LexError`] for characters no token starts with and for
/// quoted strings that are never closed.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut input = source;
    let mut tokens = Vec::new();

    loop {
        let _: PResult<&str> = take_while(0.., char::is_whitespace).parse_next(&mut input);

        let start = source.len() - input.len();
        if input.is_empty() {
            tokens.push(Token::eof(start));
            return Ok(tokens);
        }

        let Ok(kind) = next_token.parse_next(&mut input) else {
            return Err(lex_failure(&source[start..], start));
        };

        let end = source.len() - input.len();
        tokens.push(Token {
            kind,
            text: source[start..end].to_string(),
            span: Span::new(start, end),
        });
    }
}

fn lex_failure(rest: &str, offset: usize) -> LexError {
    match rest.chars().next() {
        Some('"') => LexError::UnterminatedQuote { offset },
        Some(character) => LexError::UnexpectedCharacter { character, offset },
        None => LexError::UnterminatedQuote { offset },
    }
}

fn next_token(input: &mut &str) -> PResult<TokenKind> {
    alt((
        quoted.map(TokenKind::Quoted),
        sentinel.map(|inner: &str| TokenKind::Sentinel(inner.to_string())),
        word.map(classify_word),
        '*'.value(TokenKind::Star),
        ':'.value(TokenKind::Colon),
        '='.value(TokenKind::Equal),
        '('.value(TokenKind::LeftParen),
        ')'.value(TokenKind::RightParen),
        '+'.value(TokenKind::Plus),
    ))
    .parse_next(input)
}

fn word<'s>(input: &mut &'s str) -> PResult<&'s str> {
    take_while(1.., is_word_char).parse_next(input)
}

fn classify_word(word: &str) -> TokenKind {
    if word.bytes().all(|b| b.is_ascii_digit()) {
        TokenKind::Number(word.to_string())
    } else if word.eq_ignore_ascii_case("and") {
        TokenKind::And
    } else if word.eq_ignore_ascii_case("or") {
        TokenKind::Or
    } else if word.eq_ignore_ascii_case("not") {
        TokenKind::Not
    } else {
        TokenKind::Identifier(word.to_string())
    }
}

fn sentinel<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited('<', take_while(1.., is_word_char), '>').parse_next(input)
}

/// Parse a double-quoted string. Only `\"` and `\\` are escapes; any other
/// backslash is kept as written.
fn quoted(input: &mut &str) -> PResult<String> {
    delimited('"', repeat(0.., quoted_char), '"').parse_next(input)
}

fn quoted_char(input: &mut &str) -> PResult<char> {
    alt((preceded('\\', one_of(['"', '\\'])), none_of('"'))).parse_next(input)
}
