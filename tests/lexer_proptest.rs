//! Property-based tests for the tokenizer engine
//!
//! Whatever the input, a tokenization must terminate, tile the input exactly with non-empty
//! tokens, and be a pure function of (table, input).

use proptest::prelude::*;
use statelex::languages::gsql;
use statelex::lexer::testing::assert_tokens;
use statelex::lexer::{default, rule, RuleTable, Token, TokenKind, Transition};

fn nesting_table() -> RuleTable {
    RuleTable::builder("nesting")
        .state(
            "root",
            [
                rule(r"\(", TokenKind::Punctuation).push("paren"),
                rule("\"", TokenKind::String).push("string"),
                rule(r"[a-z]+", TokenKind::Name),
                rule(r"\s+", TokenKind::Whitespace),
            ],
        )
        .state(
            "paren",
            [
                rule(r"\(", TokenKind::Punctuation).push_current(),
                rule(r"\)", TokenKind::Punctuation).pop(),
                rule(r"[0-9]+", TokenKind::Number),
                default(Transition::Pop(1)),
            ],
        )
        .state(
            "string",
            [
                rule("\"", TokenKind::String).pop(),
                rule(r#"\\."#, TokenKind::StringEscape),
                rule(r#"[^"\\]+"#, TokenKind::String),
            ],
        )
        .build()
        .unwrap()
}

/// Fragments that exercise GSQL's keywords, relations, strings and operators.
fn gsql_fragment_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("SELECT".to_string()),
            Just("FROM".to_string()),
            Just("INSERT".to_string()),
            Just("v.count".to_string()),
            Just("-(e:Follows)-".to_string()),
            Just("->".to_string()),
            Just("@@total".to_string()),
            Just("\"str\\\"ing\"".to_string()),
            Just("/* note */".to_string()),
            Just("# line".to_string()),
            Just("+=".to_string()),
            "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
            "[0-9]{1,4}(\\.[0-9]{1,3})?",
            "[ \t\n]{1,3}",
            "[(){};:,<>=+*/|$\\-]",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

fn collect(table: &RuleTable, source: &str) -> Vec<Token> {
    table.tokenize(source).collect()
}

proptest! {
    #[test]
    fn gsql_tokens_cover_arbitrary_input(source in any::<String>()) {
        let tokens = collect(gsql::table(), &source);
        assert_tokens(&source, &tokens).covers_source();
        prop_assert!(tokens.len() <= source.len());
    }

    #[test]
    fn gsql_tokens_cover_query_like_input(source in gsql_fragment_strategy()) {
        let tokens = collect(gsql::table(), &source);
        assert_tokens(&source, &tokens).covers_source();
    }

    #[test]
    fn tokenization_is_deterministic(source in gsql_fragment_strategy()) {
        let first = collect(gsql::table(), &source);
        let second = collect(gsql::table(), &source);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn state_changes_never_break_coverage(source in "[a-z0-9()\"\\\\ ]{0,64}") {
        let table = nesting_table();
        let tokens = collect(&table, &source);
        assert_tokens(&source, &tokens).covers_source();
    }

    #[test]
    fn unmatched_characters_become_single_error_tokens(
        prefix in "[a-z]{1,5}",
        stray in prop::char::range('\u{1}', '\u{8}'),
        suffix in "[a-z]{1,5}",
    ) {
        let table = nesting_table();
        let source = format!("{}{}{}", prefix, stray, suffix);
        let tokens = collect(&table, &source);
        let errors: Vec<&Token> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].start(), prefix.len());
        prop_assert_eq!(errors[0].len(), 1);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Name));
    }

    #[test]
    fn stopping_early_is_a_prefix_of_the_full_run(source in gsql_fragment_strategy(), n in 0usize..20) {
        let full = collect(gsql::table(), &source);
        let partial: Vec<Token> = gsql::table().tokenize(&source).take(n).collect();
        prop_assert_eq!(&partial[..], &full[..partial.len()]);
    }
}
