//! Token classifications and the emitted token type.
//!
//!     Classifications form a small hierarchy, written with dotted names: `Comment.Single` is a
//!     kind of `Comment`. Highlighters that do not know a specific classification fall back to
//!     its parent, which is why [TokenKind::parent] exists. The dotted name is also the serde
//!     representation, so declarative rule tables and JSON output use the same spelling.
//!
//!     `Text` is the root of the hierarchy and the classification for spans that a rule matched
//!     but chose not to classify (see [bygroups](super::rules::bygroups)).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Text,
    Whitespace,
    Error,
    Other,
    Keyword,
    #[serde(rename = "Keyword.Constant")]
    KeywordConstant,
    #[serde(rename = "Keyword.Declaration")]
    KeywordDeclaration,
    #[serde(rename = "Keyword.Type")]
    KeywordType,
    Name,
    #[serde(rename = "Name.Attribute")]
    NameAttribute,
    #[serde(rename = "Name.Builtin")]
    NameBuiltin,
    #[serde(rename = "Name.Function")]
    NameFunction,
    #[serde(rename = "Name.Variable")]
    NameVariable,
    Literal,
    String,
    #[serde(rename = "String.Escape")]
    StringEscape,
    Number,
    #[serde(rename = "Number.Float")]
    NumberFloat,
    #[serde(rename = "Number.Integer")]
    NumberInteger,
    Operator,
    #[serde(rename = "Operator.Word")]
    OperatorWord,
    Punctuation,
    Comment,
    #[serde(rename = "Comment.Single")]
    CommentSingle,
    #[serde(rename = "Comment.Multiline")]
    CommentMultiline,
    #[serde(rename = "Comment.Preproc")]
    CommentPreproc,
}

pub const TOKEN_KINDS: &[TokenKind] = &[
    TokenKind::Text,
    TokenKind::Whitespace,
    TokenKind::Error,
    TokenKind::Other,
    TokenKind::Keyword,
    TokenKind::KeywordConstant,
    TokenKind::KeywordDeclaration,
    TokenKind::KeywordType,
    TokenKind::Name,
    TokenKind::NameAttribute,
    TokenKind::NameBuiltin,
    TokenKind::NameFunction,
    TokenKind::NameVariable,
    TokenKind::Literal,
    TokenKind::String,
    TokenKind::StringEscape,
    TokenKind::Number,
    TokenKind::NumberFloat,
    TokenKind::NumberInteger,
    TokenKind::Operator,
    TokenKind::OperatorWord,
    TokenKind::Punctuation,
    TokenKind::Comment,
    TokenKind::CommentSingle,
    TokenKind::CommentMultiline,
    TokenKind::CommentPreproc,
];

impl TokenKind {
    /// Dotted classification name, e.g. `"Comment.Single"`.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Text => "Text",
            TokenKind::Whitespace => "Whitespace",
            TokenKind::Error => "Error",
            TokenKind::Other => "Other",
            TokenKind::Keyword => "Keyword",
            TokenKind::KeywordConstant => "Keyword.Constant",
            TokenKind::KeywordDeclaration => "Keyword.Declaration",
            TokenKind::KeywordType => "Keyword.Type",
            TokenKind::Name => "Name",
            TokenKind::NameAttribute => "Name.Attribute",
            TokenKind::NameBuiltin => "Name.Builtin",
            TokenKind::NameFunction => "Name.Function",
            TokenKind::NameVariable => "Name.Variable",
            TokenKind::Literal => "Literal",
            TokenKind::String => "String",
            TokenKind::StringEscape => "String.Escape",
            TokenKind::Number => "Number",
            TokenKind::NumberFloat => "Number.Float",
            TokenKind::NumberInteger => "Number.Integer",
            TokenKind::Operator => "Operator",
            TokenKind::OperatorWord => "Operator.Word",
            TokenKind::Punctuation => "Punctuation",
            TokenKind::Comment => "Comment",
            TokenKind::CommentSingle => "Comment.Single",
            TokenKind::CommentMultiline => "Comment.Multiline",
            TokenKind::CommentPreproc => "Comment.Preproc",
        }
    }

    /// The enclosing classification, `None` only for `Text`.
    pub fn parent(self) -> Option<TokenKind> {
        match self {
            TokenKind::Text => None,
            TokenKind::KeywordConstant | TokenKind::KeywordDeclaration | TokenKind::KeywordType => {
                Some(TokenKind::Keyword)
            }
            TokenKind::NameAttribute
            | TokenKind::NameBuiltin
            | TokenKind::NameFunction
            | TokenKind::NameVariable => Some(TokenKind::Name),
            TokenKind::String | TokenKind::Number => Some(TokenKind::Literal),
            TokenKind::StringEscape => Some(TokenKind::String),
            TokenKind::NumberFloat | TokenKind::NumberInteger => Some(TokenKind::Number),
            TokenKind::OperatorWord => Some(TokenKind::Operator),
            TokenKind::CommentSingle | TokenKind::CommentMultiline | TokenKind::CommentPreproc => {
                Some(TokenKind::Comment)
            }
            _ => Some(TokenKind::Text),
        }
    }

    /// True if `self` is `other` or one of its descendants.
    pub fn is_subtype_of(self, other: TokenKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Fully qualified names start at the `Token` root.
        let name = s.strip_prefix("Token.").unwrap_or(s);
        TOKEN_KINDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| format!("unknown token kind '{}'", s))
    }
}

/// A classified, non-empty span of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Token { kind, span }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn len(&self) -> usize {
        self.span.end - self.span.start
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// The slice of `source` this token covers.
    ///
    /// `source` must be the text the token was produced from.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.span.clone()]
    }

    /// Moves the token by `offset` bytes, used when splicing delegated output.
    pub(crate) fn shifted(self, offset: usize) -> Self {
        Token {
            kind: self.kind,
            span: self.span.start + offset..self.span.end + offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_names_round_trip() {
        for kind in TOKEN_KINDS {
            assert_eq!(kind.as_str().parse::<TokenKind>().unwrap(), *kind);
        }
        assert_eq!(
            "Token.Comment.Single".parse::<TokenKind>().unwrap(),
            TokenKind::CommentSingle
        );
        assert!("Comment.Triple".parse::<TokenKind>().is_err());
    }

    #[test]
    fn test_serde_uses_dotted_names() {
        let json = serde_json::to_string(&TokenKind::NameBuiltin).unwrap();
        assert_eq!(json, "\"Name.Builtin\"");
        let kind: TokenKind = serde_json::from_str("\"Comment.Multiline\"").unwrap();
        assert_eq!(kind, TokenKind::CommentMultiline);
    }

    #[test]
    fn test_hierarchy() {
        assert!(TokenKind::CommentSingle.is_subtype_of(TokenKind::Comment));
        assert!(TokenKind::NumberFloat.is_subtype_of(TokenKind::Literal));
        assert!(TokenKind::Keyword.is_subtype_of(TokenKind::Text));
        assert!(!TokenKind::Keyword.is_subtype_of(TokenKind::Name));
        assert_eq!(TokenKind::Text.parent(), None);
    }

    #[test]
    fn test_token_text_and_shift() {
        let source = "select x";
        let token = Token::new(TokenKind::Keyword, 0..6);
        assert_eq!(token.text(source), "select");
        assert_eq!(token.len(), 6);
        let moved = Token::new(TokenKind::Name, 0..1).shifted(7);
        assert_eq!(moved.span, 7..8);
        assert_eq!(moved.text(source), "x");
    }
}
