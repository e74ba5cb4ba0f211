//! State-machine regex tokenizer
//!
//!     A [RuleTable] is a set of named states, each an ordered list of rules. Tokenizing scans
//!     the input left to right; at each position the first rule of the current state whose
//!     pattern matches there classifies the matched text and may push or pop states. The result
//!     is a lazy sequence of [Token]s that covers the input exactly.
//!
//!     Building a table resolves everything that can be resolved ahead of time: includes are
//!     spliced, vocabularies become alternations, patterns are compiled, and state names are
//!     turned into indices. All configuration mistakes surface here as [ConfigurationError];
//!     tokenizing itself cannot fail.
//!
//!         let table = RuleTable::builder("ini")
//!             .state("root", [
//!                 rule(r"\[", TokenKind::Punctuation).push("section"),
//!                 rule(r";.*", TokenKind::CommentSingle),
//!                 rule(r"\s+", TokenKind::Whitespace),
//!             ])
//!             .state("section", [
//!                 rule(r"\]", TokenKind::Punctuation).pop(),
//!                 rule(r"[^\]]+", TokenKind::NameFunction),
//!             ])
//!             .build()?;
//!
//!         for token in table.tokenize(source) { .. }
//!
//! Modules
//!
//!     - [token]: token kinds and spans
//!     - [pattern]: anchored regex matching at an offset
//!     - [rules]: rule definitions and the combinators used to write tables
//!     - [table]: building and holding resolved tables
//!     - [engine]: the state stack and the lazy token iterator
//!     - [declarative]: tables written as YAML or JSON
//!     - [formats]: rendering token streams as text

pub mod declarative;
pub mod engine;
pub mod error;
pub mod formats;
pub mod pattern;
pub mod rules;
pub mod table;
pub mod testing;
pub mod token;

pub use declarative::TableSpec;
pub use engine::Tokens;
pub use error::ConfigurationError;
pub use formats::{format_tokens, FormatError, OutputFormat};
pub use rules::{
    bygroups, default, include, rule, using, words, Action, Delegate, DelegateTarget, GroupAction,
    RuleDef, Transition, Words,
};
pub use table::{RuleTable, RuleTableBuilder, RunOptions, StateId, TableOptions, ROOT_STATE};
pub use token::{Token, TokenKind};
