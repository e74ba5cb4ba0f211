//! # statelex
//!
//! A state-machine regex tokenizer for syntax highlighting, with bundled rule tables.
//!
//! Tables are built from ordered, per-state rule lists (see [lexer]) either in Rust with the
//! rule combinators or from a YAML/JSON description, and tokenize any input into a lazy,
//! gap-free token stream. [languages] holds the tables that ship with the crate.
//!
//! ## Testing
//!
//! Token stream assertions live in the [testing module](lexer::testing).

pub mod languages;
pub mod lexer;

pub use lexer::{ConfigurationError, RuleTable, Token, TokenKind, Tokens};
