//! Pattern Matcher
//!
//! Compiles one rule pattern and evaluates it at a fixed offset. Matching is anchored: a
//! pattern either matches starting exactly at the offset or not at all, it never searches
//! ahead. Look-around assertions (`\b`, `^`, `$`) still see the whole input, so `\bIN\b` at
//! offset 3 of `"ab INSERT"` behaves as it would inside the full text.
//!
//! A pattern may start with a single lookbehind assertion, `(?<=X)` or `(?<!X)`. The regex
//! engine has no lookbehind, so it is split off and evaluated as a guard: `X` must (or must
//! not) match the text ending exactly at the offset.

use super::error::ConfigurationError;
use super::table::TableOptions;
use regex::RegexBuilder;
use regex_automata::meta::Regex;
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input};
use std::ops::Range;

/// Result of a successful match: the whole span plus one entry per capture group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub span: Range<usize>,
    pub groups: Vec<Option<Range<usize>>>,
}

impl PatternMatch {
    /// Span of capture group `index` (1-based, like regex groups).
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        index
            .checked_sub(1)
            .and_then(|i| self.groups.get(i))
            .and_then(|g| g.clone())
    }
}

#[derive(Debug, Clone)]
struct Lookbehind {
    negated: bool,
    regex: regex::Regex,
}

impl Lookbehind {
    fn allows(&self, text: &str, at: usize) -> bool {
        self.regex.is_match(&text[..at]) != self.negated
    }
}

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    guard: Option<Lookbehind>,
    groups: usize,
    min_len: Option<usize>,
}

impl Pattern {
    /// Compiles `source` with the table-wide flags.
    ///
    /// Errors carry an empty state name; the table builder fills it in.
    pub fn compile(source: &str, options: &TableOptions) -> Result<Self, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidPattern {
            state: String::new(),
            pattern: source.to_string(),
            reason,
        };

        let (guard, body) = match split_lookbehind(source) {
            Some((negated, assertion, rest)) => {
                let regex = RegexBuilder::new(&format!(r"(?:{})\z", assertion))
                    .case_insensitive(options.case_insensitive)
                    .multi_line(options.multi_line)
                    .dot_matches_new_line(options.dot_matches_newline)
                    .build()
                    .map_err(|e| invalid(e.to_string()))?;
                (Some(Lookbehind { negated, regex }), rest)
            }
            None => (None, source),
        };

        let config = syntax::Config::new()
            .case_insensitive(options.case_insensitive)
            .multi_line(options.multi_line)
            .dot_matches_new_line(options.dot_matches_newline);
        let regex = Regex::builder()
            .syntax(config)
            .build(body)
            .map_err(|e| invalid(e.to_string()))?;
        let hir = syntax::parse_with(body, &config).map_err(|e| invalid(e.to_string()))?;

        Ok(Pattern {
            source: source.to_string(),
            groups: regex.captures_len().saturating_sub(1),
            min_len: hir.properties().minimum_len(),
            regex,
            guard,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of explicit capture groups.
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Whether some input lets this pattern match without consuming anything.
    pub fn can_match_empty(&self) -> bool {
        self.min_len == Some(0)
    }

    /// End offset of the match starting at `at`, if any.
    pub fn match_at(&self, text: &str, at: usize) -> Option<usize> {
        if !self.guard_allows(text, at) {
            return None;
        }
        let input = Input::new(text).range(at..).anchored(Anchored::Yes);
        self.regex.search(&input).map(|m| m.end())
    }

    /// Like [match_at](Self::match_at) but also reports capture group spans.
    pub fn captures_at(&self, text: &str, at: usize) -> Option<PatternMatch> {
        if !self.guard_allows(text, at) {
            return None;
        }
        let input = Input::new(text).range(at..).anchored(Anchored::Yes);
        let mut caps = self.regex.create_captures();
        self.regex.search_captures(&input, &mut caps);
        let whole = caps.get_match()?;
        let groups = (1..=self.groups)
            .map(|i| caps.get_group(i).map(|span| span.range()))
            .collect();
        Some(PatternMatch {
            span: whole.range(),
            groups,
        })
    }

    fn guard_allows(&self, text: &str, at: usize) -> bool {
        self.guard.as_ref().map_or(true, |g| g.allows(text, at))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Splits a leading `(?<=X)` / `(?<!X)` into `(negated, X, rest)`.
fn split_lookbehind(source: &str) -> Option<(bool, &str, &str)> {
    let negated = if source.starts_with("(?<!") {
        true
    } else if source.starts_with("(?<=") {
        false
    } else {
        return None;
    };
    let body_start = 4;
    let mut depth = 1usize;
    let mut in_class = false;
    let mut chars = source[body_start..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    let end = body_start + i;
                    return Some((negated, &source[body_start..end], &source[end + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}
