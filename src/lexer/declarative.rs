//! Declarative rule tables
//!
//!     A [TableSpec] is the serializable form of a rule table, read from YAML or JSON and
//!     turned into the same [RuleDef]s the Rust combinators produce:
//!
//!         name: ini
//!         options:
//!           case_insensitive: true
//!         states:
//!           root:
//!             - { pattern: '\[', token: Punctuation, next: section }
//!             - { pattern: ';.*', token: Comment.Single }
//!             - { words: ['true', 'false'], suffix: '\b', token: Keyword.Constant }
//!             - { include: whitespace }
//!           section:
//!             - { pattern: '\]', token: Punctuation, next: '#pop' }
//!             - { pattern: '([^=\]]+)(=)', groups: [Name.Attribute, Operator] }
//!             - { default: '#pop' }
//!           whitespace:
//!             - { pattern: '\s+', token: Whitespace }
//!
//!     Each state is a list of entries, one of:
//!     - `include: <state>`
//!     - `words: [..]` with optional `prefix`/`suffix`, a `token` and optional `next`
//!     - `pattern: <regex>` with exactly one of `token`, `groups` or `using`, and optional `next`
//!     - `default: <next>`
//!
//!     `next` is `#pop`, `#pop:N`, `#push` (the current state again), a state name, or a list of
//!     state names pushed in order. A `groups` entry is a token kind, `null` (skip the group),
//!     or `#using` / `#using:<state>` to re-tokenize the group with this table. `using: <state>`
//!     does the same for the whole match.
//!
//!     Token kinds are the dotted names of [TokenKind], optionally prefixed with `Token.`.

use super::error::ConfigurationError;
use super::rules::{self, Action, Delegate, GroupAction, RuleDef, Transition};
use super::table::{RuleTable, RuleTableBuilder, TableOptions, ROOT_STATE};
use super::token::TokenKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub options: TableOptions,
    pub states: BTreeMap<String, Vec<EntrySpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Include {
        include: String,
    },
    Words {
        words: Vec<String>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        prefix: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        suffix: String,
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<NextSpec>,
    },
    Pattern {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        groups: Option<Vec<Option<String>>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        using: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<NextSpec>,
    },
    Default {
        default: NextSpec,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextSpec {
    One(String),
    Many(Vec<String>),
}

impl TableSpec {
    pub fn from_yaml(source: &str) -> Result<Self, ConfigurationError> {
        serde_yaml::from_str(source).map_err(|e| ConfigurationError::InvalidSpec(e.to_string()))
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(source).map_err(|e| ConfigurationError::InvalidSpec(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigurationError> {
        serde_yaml::to_string(self).map_err(|e| ConfigurationError::InvalidSpec(e.to_string()))
    }

    /// Converts every entry into a [RuleDef]. Malformed entries fail here; everything else
    /// (unknown states, bad patterns, cycles) is left to [RuleTableBuilder::build].
    pub fn into_builder(self) -> Result<RuleTableBuilder, ConfigurationError> {
        let mut builder = RuleTable::builder(self.name).options(self.options);
        // `root` first so it gets the lowest state id, the rest in name order.
        let mut states: Vec<_> = self.states.into_iter().collect();
        states.sort_by_key(|(name, _)| name != ROOT_STATE);
        for (state, entries) in states {
            let defs = entries
                .into_iter()
                .map(|entry| entry.into_rule_def(&state))
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.state(state, defs);
        }
        Ok(builder)
    }

    pub fn build(self) -> Result<RuleTable, ConfigurationError> {
        self.into_builder()?.build()
    }
}

impl EntrySpec {
    fn into_rule_def(self, state: &str) -> Result<RuleDef, ConfigurationError> {
        match self {
            EntrySpec::Include { include } => Ok(rules::include(include)),
            EntrySpec::Words {
                words,
                prefix,
                suffix,
                token,
                next,
            } => {
                let vocabulary = rules::words(words).prefix(prefix).suffix(suffix);
                Ok(rules::rule(vocabulary, parse_kind(state, &token)?)
                    .then(parse_next(state, next)?))
            }
            EntrySpec::Pattern {
                pattern,
                token,
                groups,
                using,
                next,
            } => {
                let action = match (token, groups, using) {
                    (Some(token), None, None) => Action::Token(parse_kind(state, &token)?),
                    (None, Some(groups), None) => rules::bygroups(
                        groups
                            .iter()
                            .map(|group| parse_group(state, group.as_deref()))
                            .collect::<Result<Vec<_>, _>>()?,
                    ),
                    (None, None, Some(start)) => Action::Delegate(delegate_to(&start)),
                    _ => {
                        return Err(invalid(
                            state,
                            format!(
                                "pattern /{}/ needs exactly one of 'token', 'groups' or 'using'",
                                pattern
                            ),
                        ))
                    }
                };
                Ok(rules::rule(pattern, action).then(parse_next(state, next)?))
            }
            EntrySpec::Default { default } => {
                Ok(rules::default(parse_next(state, Some(default))?))
            }
        }
    }
}

fn invalid(state: &str, message: String) -> ConfigurationError {
    ConfigurationError::InvalidSpec(format!("state '{}': {}", state, message))
}

fn parse_kind(state: &str, name: &str) -> Result<TokenKind, ConfigurationError> {
    name.parse().map_err(|e: String| invalid(state, e))
}

fn delegate_to(start: &str) -> Delegate {
    if start.is_empty() || start == ROOT_STATE {
        Delegate::this()
    } else {
        Delegate::this().from_state(start)
    }
}

fn parse_group(state: &str, group: Option<&str>) -> Result<GroupAction, ConfigurationError> {
    match group {
        None => Ok(GroupAction::Skip),
        Some("#using") => Ok(GroupAction::Delegate(Delegate::this())),
        Some(directive) => match directive.strip_prefix("#using:") {
            Some(start) => Ok(GroupAction::Delegate(delegate_to(start))),
            None => parse_kind(state, directive).map(GroupAction::Kind),
        },
    }
}

fn parse_next(state: &str, next: Option<NextSpec>) -> Result<Transition, ConfigurationError> {
    match next {
        None => Ok(Transition::Stay),
        Some(NextSpec::One(target)) => parse_target(state, &target),
        Some(NextSpec::Many(targets)) => {
            if let Some(directive) = targets.iter().find(|t| t.starts_with('#')) {
                return Err(invalid(
                    state,
                    format!("'{}' cannot appear in a list of states", directive),
                ));
            }
            Ok(Transition::PushSequence(targets))
        }
    }
}

fn parse_target(state: &str, target: &str) -> Result<Transition, ConfigurationError> {
    match target {
        "#pop" => Ok(Transition::Pop(1)),
        "#push" => Ok(Transition::PushCurrent),
        _ => {
            if let Some(count) = target.strip_prefix("#pop:") {
                return match count.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Transition::Pop(n)),
                    _ => Err(invalid(state, format!("invalid pop count in '{}'", target))),
                };
            }
            if target.starts_with('#') {
                return Err(invalid(state, format!("unknown directive '{}'", target)));
            }
            Ok(Transition::Push(target.to_string()))
        }
    }
}

impl RuleTable {
    /// Builds a table from its YAML description.
    pub fn from_yaml(source: &str) -> Result<RuleTable, ConfigurationError> {
        TableSpec::from_yaml(source)?.build()
    }

    /// Builds a table from its JSON description.
    pub fn from_json(source: &str) -> Result<RuleTable, ConfigurationError> {
        TableSpec::from_json(source)?.build()
    }
}
