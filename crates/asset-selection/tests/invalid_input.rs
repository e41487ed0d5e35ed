//! Malformed selection strings are rejected with a positioned error.

use asset_selection::parser::{MAX_NESTING, MAX_OPERATORS};
use asset_selection::{Error, LexError, SemanticError, parse};
use rstest::rstest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Lex,
    Syntax,
    Semantic,
}

fn stage(err: &Error) -> Stage {
    match err {
        Error::Lex(_) => Stage::Lex,
        Error::Syntax(_) => Stage::Syntax,
        Error::Semantic(_) => Stage::Semantic,
        other => panic!("unexpected non-parse error: {other}"),
    }
}

#[rstest]
#[case::lone_plus("+", Stage::Syntax, 1)]
#[case::star_traversal("*+", Stage::Syntax, 1)]
#[case::double_star("**key:a", Stage::Syntax, 1)]
#[case::lone_not("not", Stage::Syntax, 3)]
#[case::missing_connective("key:a key:b", Stage::Syntax, 6)]
#[case::double_and("key:a and and", Stage::Syntax, 10)]
#[case::trailing_and("key:a and", Stage::Syntax, 9)]
#[case::function_without_call("sinks", Stage::Syntax, 5)]
#[case::attribute_without_value("owner", Stage::Syntax, 5)]
#[case::empty_tag_value("tag:foo=", Stage::Syntax, 8)]
#[case::unquoted_email("owner:owner@owner.com", Stage::Lex, 11)]
#[case::unknown_sentinel("owner:<none>", Stage::Semantic, 6)]
#[case::sentinel_key("key:<fake>", Stage::Syntax, 4)]
#[case::empty("", Stage::Syntax, 0)]
#[case::unknown_attribute("foo:bar", Stage::Syntax, 0)]
#[case::unknown_function("leaves(key:a)", Stage::Syntax, 0)]
#[case::unclosed_paren("(key:a", Stage::Syntax, 6)]
#[case::unopened_paren("key:a)", Stage::Syntax, 5)]
#[case::slash_in_value("owner:a/b", Stage::Syntax, 6)]
#[case::dangling_depth("2+", Stage::Syntax, 2)]
#[case::uppercase_attribute("Owner:a", Stage::Syntax, 0)]
#[case::zero_depth("key:a+0", Stage::Semantic, 6)]
#[case::null_status("status:<null>", Stage::Semantic, 7)]
#[case::second_value("kind:a=b", Stage::Semantic, 7)]
fn rejects_malformed_selection(
    #[case] text: &str,
    #[case] expected_stage: Stage,
    #[case] offset: usize,
) {
    let err = parse(text).expect_err("selection should be rejected");
    assert!(err.is_parse_error());
    assert_eq!(stage(&err), expected_stage, "{text:?}: {err}");
    assert_eq!(err.offset(), Some(offset), "{text:?}: {err}");
}

#[test]
fn unterminated_quote_points_at_opening_quote() {
    let err = parse(r#"key:"abc"#).unwrap_err();
    assert_eq!(err, Error::Lex(LexError::UnterminatedQuote { offset: 4 }));
}

#[test]
fn unknown_sentinel_reports_spelling() {
    let err = parse("owner:<none>").unwrap_err();
    assert_eq!(
        err,
        Error::Semantic(SemanticError::UnknownSentinel {
            spelling: "none".to_string(),
            offset: 6,
        })
    );
}

#[test]
fn syntax_error_names_what_was_expected() {
    let Err(Error::Syntax(err)) = parse("foo:bar") else {
        panic!("expected a syntax error");
    };
    assert!(err.expected.contains("changed_in_branch"), "{}", err.expected);
    assert_eq!(err.found, "'foo'");
}

#[rstest]
#[case::deep_parentheses(format!("{}key:a{}", "(".repeat(500), ")".repeat(500)), MAX_NESTING)]
#[case::deep_not_chain(format!("{}key:a", "not ".repeat(200_000)), MAX_NESTING * 4)]
#[case::deep_function_calls(format!("{}key:a{}", "sinks(".repeat(200), ")".repeat(200)), MAX_NESTING * 6)]
#[case::long_and_chain(vec!["key:a"; 5000].join(" and "), 6 + MAX_OPERATORS * 10)]
fn rejects_excessive_nesting(#[case] text: String, #[case] offset: usize) {
    let Err(Error::Syntax(err)) = parse(&text) else {
        panic!("expected a syntax error");
    };
    assert_eq!(err.position, offset, "{err}");
}

#[test]
fn nesting_within_limit_is_accepted() {
    let depth = MAX_NESTING - 1;
    let text = format!("{}key:a{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse(&text).unwrap(), parse("key:a").unwrap());

    let chain = vec!["key:a"; MAX_OPERATORS].join(" and ");
    assert!(parse(&chain).is_ok());
}
