//! Build-time errors for rule tables
//!
//! Tokenization itself never fails: unmatched input is recovered inside the engine. Everything
//! that can go wrong is caught while a table is being built and reported here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("table '{table}' has no 'root' state")]
    MissingRoot { table: String },

    #[error("state '{state}' references unknown state '{target}'")]
    UnknownState { state: String, target: String },

    #[error("circular include: {}", cycle.join(" -> "))]
    CircularInclude { cycle: Vec<String> },

    #[error("invalid pattern /{pattern}/ in state '{state}': {reason}")]
    InvalidPattern {
        state: String,
        pattern: String,
        reason: String,
    },

    #[error("pattern /{pattern}/ in state '{state}' can match the empty string without changing state")]
    EmptyMatch { state: String, pattern: String },

    #[error("pattern /{pattern}/ in state '{state}' has {found} capture groups but bygroups lists {expected}")]
    GroupArity {
        state: String,
        pattern: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid table definition: {0}")]
    InvalidSpec(String),
}

impl ConfigurationError {
    /// Attaches the state name to errors produced before the state was known.
    pub(crate) fn in_state(self, name: &str) -> Self {
        match self {
            ConfigurationError::InvalidPattern {
                state,
                pattern,
                reason,
            } if state.is_empty() => ConfigurationError::InvalidPattern {
                state: name.to_string(),
                pattern,
                reason,
            },
            other => other,
        }
    }
}
