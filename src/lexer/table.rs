//! Rule Table
//!
//!     A [RuleTable] is the immutable, resolved form of a language definition: every state
//!     holds a flat, ordered list of compiled rules with includes already spliced in and
//!     state references already resolved to [StateId]s. It is built once through
//!     [RuleTableBuilder] and then shared read-only by any number of tokenizations, including
//!     concurrent ones (`RuleTable` is `Send + Sync`).
//!
//! Build-time checks
//!
//!     Everything the engine relies on is verified in `build()` and reported as a
//!     [ConfigurationError]:
//!     - the table has a `root` state and every referenced state exists
//!     - includes are acyclic
//!     - every pattern compiles
//!     - no rule can match the empty string while staying in the same state
//!     - `bygroups` lists exactly one action per capture group

use super::engine::Tokens;
use super::error::ConfigurationError;
use super::pattern::Pattern;
use super::rules::{Action, DelegateTarget, GroupAction, RuleDef, Transition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const ROOT_STATE: &str = "root";

/// Flags and limits applied to every rule of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub case_insensitive: bool,
    pub dot_matches_newline: bool,
    /// `^` and `$` match at line boundaries.
    pub multi_line: bool,
    #[serde(flatten)]
    pub run: RunOptions,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            case_insensitive: false,
            dot_matches_newline: false,
            multi_line: true,
            run: RunOptions::default(),
        }
    }
}

/// Options read by the engine at tokenization time. Unlike the regex flags these can be
/// changed on a built table, see [RuleTable::with_run_options].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// An unmatched `\n` becomes `Whitespace` and resets the stack to its bottom state.
    pub reset_on_newline: bool,
    pub max_stack_depth: usize,
    pub max_delegate_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            reset_on_newline: false,
            max_stack_depth: 1024,
            max_delegate_depth: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(usize);

impl StateId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Transition with state names resolved to ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Next {
    Stay,
    Push(StateId),
    PushCurrent,
    Pop(usize),
    PushSequence(Vec<StateId>),
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) pattern: Pattern,
    pub(crate) action: Action,
    pub(crate) transition: Transition,
    pub(crate) next: Next,
}

impl Rule {
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn transition(&self) -> &Transition {
        &self.transition
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.action == other.action
            && self.transition == other.transition
    }
}

#[derive(Debug, Clone)]
pub struct State {
    name: String,
    rules: Vec<Arc<Rule>>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    name: String,
    options: TableOptions,
    states: Arc<[State]>,
    index: Arc<HashMap<String, StateId>>,
    root: StateId,
}

impl RuleTable {
    pub fn builder(name: impl Into<String>) -> RuleTableBuilder {
        RuleTableBuilder {
            name: name.into(),
            options: TableOptions::default(),
            states: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.state_id(name).map(|id| self.state_at(id))
    }

    /// States in definition order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    pub(crate) fn state_at(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    /// Same compiled rules, different run-time options.
    pub fn with_run_options(&self, run: RunOptions) -> RuleTable {
        RuleTable {
            options: TableOptions { run, ..self.options },
            ..self.clone()
        }
    }

    /// Tokenizes `text` starting in the `root` state.
    pub fn tokenize<'t>(&'t self, text: &'t str) -> Tokens<'t> {
        Tokens::new(self, text, self.root)
    }

    /// Tokenizes `text` starting in `initial`.
    pub fn tokenize_from<'t>(&'t self, text: &'t str, initial: StateId) -> Tokens<'t> {
        Tokens::new(self, text, initial)
    }
}

/// Collects state definitions and resolves them into a [RuleTable].
#[derive(Debug, Clone)]
pub struct RuleTableBuilder {
    name: String,
    options: TableOptions,
    states: Vec<(String, Vec<RuleDef>)>,
}

impl RuleTableBuilder {
    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state<I>(mut self, name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = RuleDef>,
    {
        self.states.push((name.into(), rules.into_iter().collect()));
        self
    }

    pub fn build(self) -> Result<RuleTable, ConfigurationError> {
        let mut index = HashMap::new();
        for (i, (name, _)) in self.states.iter().enumerate() {
            if index.insert(name.clone(), StateId(i)).is_some() {
                return Err(ConfigurationError::InvalidSpec(format!(
                    "state '{}' is defined twice in table '{}'",
                    name, self.name
                )));
            }
        }
        let root = *index
            .get(ROOT_STATE)
            .ok_or_else(|| ConfigurationError::MissingRoot {
                table: self.name.clone(),
            })?;

        let mut resolver = Resolver {
            defs: &self.states,
            index: &index,
            options: &self.options,
            resolved: vec![None; self.states.len()],
            visiting: Vec::new(),
        };
        let mut states = Vec::with_capacity(self.states.len());
        for (i, (name, _)) in self.states.iter().enumerate() {
            let rules = resolver.resolve(i)?;
            states.push(State {
                name: name.clone(),
                rules,
            });
        }

        debug!(
            table = %self.name,
            states = states.len(),
            rules = states.iter().map(|s| s.rules.len()).sum::<usize>(),
            "built rule table"
        );

        Ok(RuleTable {
            name: self.name,
            options: self.options,
            states: states.into(),
            index: Arc::new(index),
            root,
        })
    }
}

/// Depth-first include expansion with memoization; each state is compiled once and shared
/// by every state that includes it.
struct Resolver<'b> {
    defs: &'b [(String, Vec<RuleDef>)],
    index: &'b HashMap<String, StateId>,
    options: &'b TableOptions,
    resolved: Vec<Option<Vec<Arc<Rule>>>>,
    visiting: Vec<usize>,
}

impl Resolver<'_> {
    fn resolve(&mut self, state: usize) -> Result<Vec<Arc<Rule>>, ConfigurationError> {
        if let Some(rules) = &self.resolved[state] {
            return Ok(rules.clone());
        }
        if let Some(pos) = self.visiting.iter().position(|&s| s == state) {
            let mut cycle: Vec<String> = self.visiting[pos..]
                .iter()
                .map(|&s| self.defs[s].0.clone())
                .collect();
            cycle.push(self.defs[state].0.clone());
            return Err(ConfigurationError::CircularInclude { cycle });
        }

        self.visiting.push(state);
        let (name, defs) = &self.defs[state];
        let mut rules = Vec::new();
        for def in defs {
            match def {
                RuleDef::Include(target) => {
                    let target_id = self.lookup(name, target)?;
                    rules.extend(self.resolve(target_id.0)?);
                }
                RuleDef::Rule {
                    pattern,
                    action,
                    next,
                } => rules.push(Arc::new(self.compile(name, pattern, action, next)?)),
            }
        }
        self.visiting.pop();

        self.resolved[state] = Some(rules.clone());
        Ok(rules)
    }

    fn compile(
        &self,
        state: &str,
        source: &str,
        action: &Action,
        transition: &Transition,
    ) -> Result<Rule, ConfigurationError> {
        let pattern = Pattern::compile(source, self.options).map_err(|e| e.in_state(state))?;

        if pattern.can_match_empty() && *transition == Transition::Stay {
            return Err(ConfigurationError::EmptyMatch {
                state: state.to_string(),
                pattern: source.to_string(),
            });
        }

        match action {
            Action::Token(_) => {}
            Action::Delegate(delegate) => {
                self.check_delegate(state, &delegate.target, &delegate.state)?
            }
            Action::ByGroups(groups) => {
                if groups.len() != pattern.group_count() {
                    return Err(ConfigurationError::GroupArity {
                        state: state.to_string(),
                        pattern: source.to_string(),
                        expected: groups.len(),
                        found: pattern.group_count(),
                    });
                }
                for group in groups {
                    if let GroupAction::Delegate(delegate) = group {
                        self.check_delegate(state, &delegate.target, &delegate.state)?;
                    }
                }
            }
        }

        let next = match transition {
            Transition::Stay => Next::Stay,
            Transition::Push(target) => Next::Push(self.lookup(state, target)?),
            Transition::PushCurrent => Next::PushCurrent,
            Transition::Pop(n) => Next::Pop(*n),
            Transition::PushSequence(targets) => Next::PushSequence(
                targets
                    .iter()
                    .map(|target| self.lookup(state, target))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(Rule {
            pattern,
            action: action.clone(),
            transition: transition.clone(),
            next,
        })
    }

    fn check_delegate(
        &self,
        state: &str,
        target: &DelegateTarget,
        start: &Option<String>,
    ) -> Result<(), ConfigurationError> {
        let Some(start) = start else {
            return Ok(());
        };
        let known = match target {
            DelegateTarget::This => self.index.contains_key(start),
            DelegateTarget::Table(table) => table.state_id(start).is_some(),
        };
        if known {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownState {
                state: state.to_string(),
                target: start.clone(),
            })
        }
    }

    fn lookup(&self, state: &str, target: &str) -> Result<StateId, ConfigurationError> {
        self.index
            .get(target)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownState {
                state: state.to_string(),
                target: target.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::rules::{bygroups, default, include, rule, using, Delegate};
    use crate::lexer::token::TokenKind;

    fn comment_and_words() -> RuleTableBuilder {
        RuleTable::builder("test")
            .state(
                "root",
                [
                    include("comment"),
                    rule("[a-z]+", TokenKind::Name),
                    include("whitespace"),
                ],
            )
            .state("comment", [rule("#.*", TokenKind::Comment)])
            .state("whitespace", [rule(r"\s+", TokenKind::Whitespace)])
    }

    #[test]
    fn test_include_splices_rules_in_place() {
        let table = comment_and_words().build().unwrap();
        let sources: Vec<&str> = table
            .state("root")
            .unwrap()
            .rules()
            .iter()
            .map(|r| r.pattern().source())
            .collect();
        assert_eq!(sources, vec!["#.*", "[a-z]+", r"\s+"]);
    }

    #[test]
    fn test_include_equals_manual_concatenation() {
        let included = comment_and_words().build().unwrap();
        let manual = RuleTable::builder("manual")
            .state(
                "root",
                [
                    rule("#.*", TokenKind::Comment),
                    rule("[a-z]+", TokenKind::Name),
                    rule(r"\s+", TokenKind::Whitespace),
                ],
            )
            .build()
            .unwrap();
        assert_eq!(
            included.state("root").unwrap().rules(),
            manual.state("root").unwrap().rules()
        );
    }

    #[test]
    fn test_nested_includes_flatten() {
        let table = RuleTable::builder("nested")
            .state("root", [include("a"), rule("z", TokenKind::Name)])
            .state("a", [rule("x", TokenKind::Keyword), include("b")])
            .state("b", [rule("y", TokenKind::Operator)])
            .build()
            .unwrap();
        let sources: Vec<&str> = table
            .state("root")
            .unwrap()
            .rules()
            .iter()
            .map(|r| r.pattern().source())
            .collect();
        assert_eq!(sources, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_circular_include_is_rejected() {
        let err = RuleTable::builder("cycle")
            .state("root", [include("a")])
            .state("a", [include("b")])
            .state("b", [include("a")])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::CircularInclude {
                cycle: vec!["a".into(), "b".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_self_include_is_rejected() {
        let err = RuleTable::builder("self")
            .state("root", [rule("x", TokenKind::Name), include("root")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::CircularInclude { .. }));
    }

    #[test]
    fn test_missing_root() {
        let err = RuleTable::builder("empty")
            .state("main", [rule("x", TokenKind::Name)])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingRoot {
                table: "empty".into()
            }
        );
    }

    #[test]
    fn test_unknown_states_are_rejected() {
        let err = RuleTable::builder("t")
            .state("root", [rule("\"", TokenKind::String).push("string")])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownState {
                state: "root".into(),
                target: "string".into()
            }
        );

        let err = RuleTable::builder("t")
            .state("root", [include("missing")])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownState { .. }));

        let err = RuleTable::builder("t")
            .state(
                "root",
                [rule("x", using(Delegate::this().from_state("nowhere")))],
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownState { .. }));
    }

    #[test]
    fn test_empty_match_with_stay_is_rejected() {
        let err = RuleTable::builder("t")
            .state("root", [rule(r"\s*", TokenKind::Whitespace)])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::EmptyMatch {
                state: "root".into(),
                pattern: r"\s*".into()
            }
        );
    }

    #[test]
    fn test_empty_match_with_transition_is_allowed() {
        let table = RuleTable::builder("t")
            .state("root", [rule("a", TokenKind::Name).push("inner")])
            .state(
                "inner",
                [rule("b", TokenKind::Name), default(Transition::Pop(1))],
            )
            .build();
        assert!(table.is_ok());
    }

    #[test]
    fn test_bygroups_arity_must_match() {
        let err = RuleTable::builder("t")
            .state(
                "root",
                [rule(
                    r"(a)(b)",
                    bygroups([TokenKind::Name, TokenKind::Name, TokenKind::Name]),
                )],
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::GroupArity {
                state: "root".into(),
                pattern: "(a)(b)".into(),
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_invalid_pattern_names_state() {
        let err = RuleTable::builder("t")
            .state("root", [rule("[a-", TokenKind::Name)])
            .build()
            .unwrap_err();
        match err {
            ConfigurationError::InvalidPattern { state, pattern, .. } => {
                assert_eq!(state, "root");
                assert_eq!(pattern, "[a-");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_state_is_rejected() {
        let err = RuleTable::builder("t")
            .state("root", [rule("a", TokenKind::Name)])
            .state("root", [rule("b", TokenKind::Name)])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSpec(_)));
    }

    #[test]
    fn test_run_options_can_be_replaced() {
        let table = comment_and_words().build().unwrap();
        let run = RunOptions {
            max_stack_depth: 4,
            ..RunOptions::default()
        };
        let limited = table.with_run_options(run);
        assert_eq!(limited.options().run.max_stack_depth, 4);
        assert_eq!(limited.options().multi_line, table.options().multi_line);
        assert_eq!(limited.state_id("comment"), table.state_id("comment"));
    }

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleTable>();
    }
}
