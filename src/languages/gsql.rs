//! TigerGraph GSQL (3.x) queries
//!
//! Case-insensitive throughout. Keywords are whole words not preceded by `.` (so `v.count`
//! stays a method call); clause names, accumulator types and built-in functions are
//! matched as plain prefixes. Edge patterns such as `-(e:Follows)-` re-tokenize the
//! parenthesized part with this same table.

use crate::lexer::error::ConfigurationError;
use crate::lexer::rules::{bygroups, include, rule, using, words, Delegate, GroupAction};
use crate::lexer::table::{RuleTable, TableOptions};
use crate::lexer::token::TokenKind;
use once_cell::sync::Lazy;

pub const NAME: &str = "GSQL";

pub const KEYWORDS: &[&str] = &[
    "ACCUM",
    "AND",
    "ANY",
    "API",
    "AS",
    "ASC",
    "BAG",
    "BATCH",
    "BETWEEN",
    "BOOL",
    "BOTH",
    "BREAK",
    "BY",
    "CASE",
    "CATCH",
    "COMPRESS",
    "CONTINUE",
    "COUNT",
    "CREATE",
    "DATETIME",
    "DELETE",
    "DESC",
    "DISTRIBUTED",
    "DO",
    "DOUBLE",
    "EDGE",
    "ELSE",
    "END",
    "ESCAPE",
    "EXCEPTION",
    "FALSE",
    "FILE",
    "FLOAT",
    "FOREACH",
    "FOR",
    "FROM",
    "GRAPH",
    "GROUP",
    "GSQL_INT_MAX",
    "GSQL_INT_MIN",
    "GSQL_UINT_MAX",
    "HAVING",
    "IF",
    "IN",
    "INSERT",
    "INT",
    "INTERPRET",
    "INTERSECT",
    "INTERVAL",
    "INTO",
    "IS",
    "ISEMPTY",
    "JSONARRAY",
    "JSONOBJECT",
    "LASTHOP",
    "LEADING",
    "LIKE",
    "LIMIT",
    "LIST",
    "LOAD_ACCUM",
    "MAP",
    "MATCH",
    "MINUS",
    "NOT",
    "NULL",
    "OFFSET",
    "OR",
    "ORDER",
    "PATH",
    "PER",
    "PINNED",
    "POST_ACCUM",
    "POST-ACCUM",
    "PRIMARY_ID",
    "PRINT",
    "QUERY",
    "RAISE",
    "RANGE",
    "REPLACE",
    "RESET_COLLECTION_ACCUM",
    "RETURN",
    "RETURNS",
    "RUN",
    "SAMPLE",
    "SELECT",
    "SELECT_VERTEX",
    "SET",
    "SRC",
    "STATIC",
    "STRING",
    "SYNTAX",
    "TARGET",
    "TAGSTGT",
    "THEN",
    "TO",
    "TO_CSV",
    "TRAILING",
    "TRUE",
    "TRY",
    "TUPLE",
    "TYPEDEF",
    "UINT",
    "UNION",
    "UPDATE",
    "VALUES",
    "VERTEX",
    "WHEN",
    "WHERE",
    "WHILE",
    "WITH",
];

pub const CLAUSES: &[&str] = &[
    "accum",
    "having",
    "limit",
    "order",
    "postAccum",
    "sample",
    "where",
];

pub const ACCUMULATORS: &[&str] = &[
    "andaccum",
    "arrayaccum",
    "avgaccum",
    "bagaccum",
    "bitwiseandaccum",
    "bitwiseoraccum",
    "groupbyaccum",
    "heapaccum",
    "listaccum",
    "MapAccum",
    "maxaccum",
    "minaccum",
    "oraccum",
    "setaccum",
    "sumaccum",
];

pub const FUNCTIONS: &[&str] = &[
    "abs",
    "acos",
    "addTags",
    "ascii",
    "asin",
    "atan",
    "atan2",
    "avg",
    "ceil",
    "chr",
    "clear",
    "coalesce",
    "concat",
    "contains",
    "containsKey",
    "cos",
    "cosh",
    "count",
    "datetime_add",
    "datetime_diff",
    "datetime_format",
    "datetime_sub",
    "datetime_to_epoch",
    "day",
    "degrees",
    "difference",
    "differenceTags",
    "edgeAttribute",
    "epoch_to_datetime",
    "evaluate",
    "exp",
    "filter",
    "find_in_set",
    "flatten",
    "flatten_json_array",
    "float_to_int",
    "floor",
    "fmod",
    "get",
    "getAttr",
    "getBool",
    "getDouble",
    "getInt",
    "getJsonArray",
    "getJsonObject",
    "getString",
    "getTags",
    "getvid",
    "gsql_concat",
    "gsql_current_time_epoch",
    "gsql_day",
    "gsql_day_epoch",
    "gsql_find",
    "gsql_is_false",
    "gsql_is_not_empty_string",
    "gsql_is_true",
    "gsql_length",
    "gsql_lower",
    "gsql_ltrim",
    "gsql_month",
    "gsql_month_epoch",
    "gsql_regex_match",
    "gsql_regex_replace",
    "gsql_replace",
    "gsql_reverse",
    "gsql_rtrim",
    "gsql_split_by_space",
    "gsql_substring",
    "gsql_to_bool",
    "gsql_to_int",
    "gsql_to_uint",
    "gsql_token_equal",
    "gsql_token_ignore_case_equal",
    "gsql_trim",
    "gsql_ts_to_epoch_seconds",
    "gsql_upper",
    "gsql_uuid_v4",
    "gsql_year",
    "gsql_year_epoch",
    "hasTags",
    "hour",
    "ignore_if_exists",
    "instr",
    "intersectTags",
    "isDirected",
    "isTaggable",
    "ldexp",
    "left",
    "length",
    "log",
    "log10",
    "log2",
    "lower",
    "lpad",
    "ltrim",
    "max",
    "min",
    "minute",
    "month",
    "neighborAttribute",
    "neighbors",
    "now",
    "outdegree",
    "overwrite",
    "parse_json_array",
    "parse_json_object",
    "PI",
    "pop",
    "pow",
    "println",
    "radians",
    "rand",
    "reallocate",
    "reduce",
    "remove",
    "removeAll",
    "removeAllTags",
    "removeTags",
    "replace",
    "resize",
    "right",
    "round",
    "rpad",
    "rtrim",
    "second",
    "selectVertex",
    "setAttr",
    "sign",
    "sin",
    "sinh",
    "size",
    "soundex",
    "space",
    "split",
    "sqrt",
    "square",
    "str_to_int",
    "substr",
    "sum",
    "tan",
    "tanh",
    "to_datetime",
    "to_float",
    "to_int",
    "to_string",
    "to_vertex",
    "to_vertex_set",
    "token_len",
    "top",
    "translate",
    "trim",
    "trunc",
    "type",
    "upper",
    "year",
];

static GSQL: Lazy<RuleTable> =
    Lazy::new(|| build().expect("bundled GSQL rule table failed to build"));

/// The shared, lazily built GSQL table.
pub fn table() -> &'static RuleTable {
    &GSQL
}

/// Builds a fresh GSQL table.
pub fn build() -> Result<RuleTable, ConfigurationError> {
    RuleTable::builder(NAME)
        .options(TableOptions {
            case_insensitive: true,
            multi_line: true,
            ..TableOptions::default()
        })
        .state(
            "root",
            [
                include("comment"),
                include("keywords"),
                include("clauses"),
                include("accums"),
                include("relations"),
                include("functions"),
                include("strings"),
                include("whitespace"),
                include("barewords"),
                include("operators"),
            ],
        )
        .state(
            "comment",
            [
                rule(r"#.*", TokenKind::CommentSingle),
                rule(r"/\*(.|\n)*?\*/", TokenKind::CommentMultiline),
            ],
        )
        .state(
            "keywords",
            [rule(
                words(KEYWORDS.iter().copied()).prefix(r"(?<!\.)").suffix(r"\b"),
                TokenKind::Keyword,
            )],
        )
        .state(
            "clauses",
            [rule(words(CLAUSES.iter().copied()), TokenKind::NameBuiltin)],
        )
        .state(
            "accums",
            [rule(words(ACCUMULATORS.iter().copied()), TokenKind::NameBuiltin)],
        )
        .state(
            "functions",
            [rule(words(FUNCTIONS.iter().copied()), TokenKind::NameFunction)],
        )
        .state(
            "relations",
            [
                rule(
                    r"(-\s?)(\(.*:\w?\))(\s?-)",
                    bygroups([
                        GroupAction::from(TokenKind::Operator),
                        using(Delegate::this()).into(),
                        TokenKind::Operator.into(),
                    ]),
                ),
                rule(r"->|<-", TokenKind::Operator),
                rule(r"[.*{}\[\]<>_]", TokenKind::Punctuation),
            ],
        )
        .state(
            "strings",
            [
                rule(r#""([^"\\]|\\.)*""#, TokenKind::String),
                rule(r"@{1,2}\w+", TokenKind::NameVariable),
            ],
        )
        .state("whitespace", [rule(r"\s+", TokenKind::Whitespace)])
        .state(
            "barewords",
            [
                rule(r"[a-z]\w*", TokenKind::Name),
                rule(r"(\d+\.\d+|\d+)", TokenKind::Number),
            ],
        )
        .state(
            "operators",
            [
                rule(
                    r"\$|[^0-9|/\-](-=|\+=|\*=|\\=|=|==|===|\+|-|\*|\\|\+=|>|<)[^>|/]",
                    TokenKind::Operator,
                ),
                rule(r"(\||\(|\)|,|;|=|-|\+|\*|/|>|<|:)", TokenKind::Operator),
            ],
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::testing::{assert_tokens, kinds};
    use crate::lexer::token::Token;

    #[test]
    fn test_table_builds_with_every_state() {
        let table = build().unwrap();
        for state in [
            "root",
            "comment",
            "keywords",
            "clauses",
            "accums",
            "functions",
            "relations",
            "strings",
            "whitespace",
            "barewords",
            "operators",
        ] {
            assert!(table.state(state).is_some(), "missing state {state}");
        }
        // Every included rule lands in root, in include order.
        assert_eq!(table.state("root").map(|s| s.rules().len()), Some(16));
    }

    #[test]
    fn test_shared_table_is_built_once() {
        assert!(std::ptr::eq(table(), table()));
    }

    #[test]
    fn test_select_statement() {
        let source = "SELECT s FROM Start:s WHERE s.age > 30;";
        let tokens: Vec<Token> = table().tokenize(source).collect();
        assert_tokens(source, &tokens)
            .covers_source()
            .no_errors()
            .token(0, TokenKind::Keyword, "SELECT")
            .contains(TokenKind::Keyword, "FROM")
            .contains(TokenKind::Keyword, "WHERE")
            .contains(TokenKind::Number, "30");
    }

    #[test]
    fn test_keyword_after_dot_is_not_a_keyword() {
        let source = "count v.count";
        let tokens: Vec<Token> = table().tokenize(source).collect();
        assert_eq!(
            kinds(&tokens, source),
            vec![
                (TokenKind::Keyword, "count"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Name, "v"),
                (TokenKind::Punctuation, "."),
                (TokenKind::NameFunction, "count"),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let source = "select";
        let tokens: Vec<Token> = table().tokenize(source).collect();
        assert_eq!(kinds(&tokens, source), vec![(TokenKind::Keyword, "select")]);
    }
}
