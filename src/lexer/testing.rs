//! Testing utilities for token streams
//!
//! Token tests mostly want to say two things: the stream is well formed (tokens tile the
//! input with no gap or overlap) and particular tokens have a given kind and text. Spelling
//! that out with raw spans is noisy, so this module has a small factory for expected tokens
//! and a fluent assertion entry point:
//!
//! ```rust-example
//! use statelex::lexer::testing::assert_tokens;
//!
//! let tokens: Vec<Token> = table.tokenize(source).collect();
//! assert_tokens(source, &tokens)
//!     .covers_source()
//!     .no_errors()
//!     .token(0, TokenKind::Keyword, "SELECT")
//!     .contains(TokenKind::NameVariable, "@@sum");
//! ```

use super::token::{Token, TokenKind};

/// Builds tokens from `(kind, start, end)` triples.
pub fn mk_tokens(triples: &[(TokenKind, usize, usize)]) -> Vec<Token> {
    triples
        .iter()
        .map(|&(kind, start, end)| Token::new(kind, start..end))
        .collect()
}

/// Pairs each token's kind with its text.
pub fn kinds<'s>(tokens: &[Token], source: &'s str) -> Vec<(TokenKind, &'s str)> {
    tokens.iter().map(|t| (t.kind, t.text(source))).collect()
}

/// Create an assertion builder for a token stream over `source`
pub fn assert_tokens<'a>(source: &'a str, tokens: &'a [Token]) -> TokensAssertion<'a> {
    TokensAssertion { source, tokens }
}

pub struct TokensAssertion<'a> {
    source: &'a str,
    tokens: &'a [Token],
}

impl<'a> TokensAssertion<'a> {
    /// Assert tokens are non-empty, contiguous and exactly cover the source
    pub fn covers_source(self) -> Self {
        let mut expected = 0;
        for (i, token) in self.tokens.iter().enumerate() {
            assert!(
                !token.is_empty(),
                "token {} is empty: {:?}\n{}",
                i,
                token,
                self.summary()
            );
            assert_eq!(
                token.start(),
                expected,
                "token {} starts at {}, expected {}\n{}",
                i,
                token.start(),
                expected,
                self.summary()
            );
            expected = token.end();
        }
        assert_eq!(
            expected,
            self.source.len(),
            "tokens end at {}, source has {} bytes\n{}",
            expected,
            self.source.len(),
            self.summary()
        );
        let joined: String = self.tokens.iter().map(|t| t.text(self.source)).collect();
        assert_eq!(joined, self.source);
        self
    }

    /// Assert no token has kind `Error`
    pub fn no_errors(self) -> Self {
        if let Some(token) = self.tokens.iter().find(|t| t.kind == TokenKind::Error) {
            panic!(
                "unexpected error token {:?} at {}\n{}",
                token.text(self.source),
                token.start(),
                self.summary()
            );
        }
        self
    }

    /// Assert the number of tokens
    pub fn count(self, expected: usize) -> Self {
        assert_eq!(
            self.tokens.len(),
            expected,
            "expected {} tokens, found {}\n{}",
            expected,
            self.tokens.len(),
            self.summary()
        );
        self
    }

    /// Assert kind and text of the token at `index`
    pub fn token(self, index: usize, kind: TokenKind, text: &str) -> Self {
        let Some(token) = self.tokens.get(index) else {
            panic!(
                "token index {} out of bounds ({} tokens)\n{}",
                index,
                self.tokens.len(),
                self.summary()
            );
        };
        assert_eq!(
            (token.kind, token.text(self.source)),
            (kind, text),
            "token {} mismatch\n{}",
            index,
            self.summary()
        );
        self
    }

    /// Assert some token has this kind and text
    pub fn contains(self, kind: TokenKind, text: &str) -> Self {
        assert!(
            self.tokens
                .iter()
                .any(|t| t.kind == kind && t.text(self.source) == text),
            "no {} token with text {:?}\n{}",
            kind,
            text,
            self.summary()
        );
        self
    }

    /// Assert every token with this text has this kind
    pub fn all_with_text(self, text: &str, kind: TokenKind) -> Self {
        for token in self.tokens.iter().filter(|t| t.text(self.source) == text) {
            assert_eq!(
                token.kind,
                kind,
                "{:?} at {} is {}, expected {}\n{}",
                text,
                token.start(),
                token.kind,
                kind,
                self.summary()
            );
        }
        self
    }

    fn summary(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("  {}..{} {} {:?}", t.start(), t.end(), t.kind, t.text(self.source)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_source_accepts_tiling() {
        let tokens = mk_tokens(&[(TokenKind::Name, 0, 2), (TokenKind::Whitespace, 2, 3)]);
        assert_tokens("ab ", &tokens)
            .covers_source()
            .count(2)
            .token(0, TokenKind::Name, "ab");
    }

    #[test]
    #[should_panic(expected = "starts at 3")]
    fn test_covers_source_rejects_gap() {
        let tokens = mk_tokens(&[(TokenKind::Name, 0, 2), (TokenKind::Name, 3, 4)]);
        assert_tokens("ab c", &tokens).covers_source();
    }

    #[test]
    #[should_panic(expected = "unexpected error token")]
    fn test_no_errors_rejects_error_token() {
        let tokens = mk_tokens(&[(TokenKind::Error, 0, 1)]);
        assert_tokens("?", &tokens).no_errors();
    }
}
