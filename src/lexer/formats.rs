//! Output formats for token streams
//!
//! - `simple`: one `<Kind:text>` per line, control characters escaped
//! - `raw`: `start len Kind "text"` per line
//! - `json`: an array of `{kind, start, end, text}` records

use super::token::{Token, TokenKind};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("unknown output format '{0}' (expected one of: simple, raw, json)")]
    UnknownFormat(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Simple,
    Raw,
    Json,
}

impl OutputFormat {
    pub const ALL: &'static [OutputFormat] =
        &[OutputFormat::Simple, OutputFormat::Raw, OutputFormat::Json];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Simple => "simple",
            OutputFormat::Raw => "raw",
            OutputFormat::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .iter()
            .copied()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormatError::UnknownFormat(s.to_string()))
    }
}

#[derive(Serialize)]
struct TokenRecord<'s> {
    kind: TokenKind,
    start: usize,
    end: usize,
    text: &'s str,
}

/// Renders `tokens` (spans into `source`) in the given format.
pub fn format_tokens<I>(tokens: I, source: &str, format: OutputFormat) -> Result<String, FormatError>
where
    I: IntoIterator<Item = Token>,
{
    let mut out = String::new();
    match format {
        OutputFormat::Simple => {
            for token in tokens {
                out.push_str(&format!(
                    "<{}:{}>\n",
                    token.kind,
                    token.text(source).escape_debug()
                ));
            }
        }
        OutputFormat::Raw => {
            for token in tokens {
                out.push_str(&format!(
                    "{} {} {} {:?}\n",
                    token.start(),
                    token.len(),
                    token.kind,
                    token.text(source)
                ));
            }
        }
        OutputFormat::Json => {
            let records: Vec<TokenRecord<'_>> = tokens
                .into_iter()
                .map(|token| TokenRecord {
                    kind: token.kind,
                    start: token.start(),
                    end: token.end(),
                    text: token.text(source),
                })
                .collect();
            out = serde_json::to_string_pretty(&records)?;
            out.push('\n');
        }
    }
    Ok(out)
}
