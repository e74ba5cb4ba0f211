//! Rule definitions and combinators
//!
//!     A rule table is written as a list of [RuleDef]s per state. The combinators in this
//!     module are table-construction helpers: they only describe rules, and
//!     [RuleTableBuilder::build](super::table::RuleTableBuilder::build) expands them once into
//!     flat per-state rule lists.
//!
//!         include("comment")                       splice another state's rules here
//!         rule(r"\s+", TokenKind::Whitespace)      one pattern, one classification
//!         rule(p, bygroups([..]))                  one classification per capture group
//!         rule(p, using(Delegate::this()))         re-tokenize the match with a fresh engine
//!         rule(words(["IF", "IN"]).suffix(r"\b"), TokenKind::Keyword)
//!         default(Transition::Pop(1))              change state without consuming input
//!
//!     Transitions are attached with the chaining helpers on [RuleDef]: `.push("string")`,
//!     `.pop()`, `.pop_n(2)`, `.push_current()`, `.push_all([..])` or `.then(..)`.

use super::table::RuleTable;
use super::token::TokenKind;
use std::sync::Arc;

/// What happens to the state stack after a rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Push(String),
    /// Push the current state again.
    PushCurrent,
    /// Pop `n` states; the bottom state is never popped.
    Pop(usize),
    PushSequence(Vec<String>),
}

/// Which table a delegated span is re-tokenized with.
#[derive(Debug, Clone)]
pub enum DelegateTarget {
    /// The table the rule belongs to.
    This,
    Table(Arc<RuleTable>),
}

impl PartialEq for DelegateTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DelegateTarget::This, DelegateTarget::This) => true,
            (DelegateTarget::Table(a), DelegateTarget::Table(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A nested tokenizer: a target table plus the state it starts in (`root` if unset).
#[derive(Debug, Clone, PartialEq)]
pub struct Delegate {
    pub target: DelegateTarget,
    pub state: Option<String>,
}

impl Delegate {
    pub fn this() -> Self {
        Delegate {
            target: DelegateTarget::This,
            state: None,
        }
    }

    pub fn table(table: Arc<RuleTable>) -> Self {
        Delegate {
            target: DelegateTarget::Table(table),
            state: None,
        }
    }

    pub fn from_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Per-capture-group action inside [bygroups].
#[derive(Debug, Clone, PartialEq)]
pub enum GroupAction {
    Kind(TokenKind),
    Delegate(Delegate),
    /// Match the group but do not classify it; its text is emitted as `Text`.
    Skip,
}

impl From<TokenKind> for GroupAction {
    fn from(kind: TokenKind) -> Self {
        GroupAction::Kind(kind)
    }
}

impl From<Option<TokenKind>> for GroupAction {
    fn from(kind: Option<TokenKind>) -> Self {
        kind.map_or(GroupAction::Skip, GroupAction::Kind)
    }
}

impl From<Delegate> for GroupAction {
    fn from(delegate: Delegate) -> Self {
        GroupAction::Delegate(delegate)
    }
}

/// How a matched span is turned into tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Token(TokenKind),
    ByGroups(Vec<GroupAction>),
    Delegate(Delegate),
}

impl From<TokenKind> for Action {
    fn from(kind: TokenKind) -> Self {
        Action::Token(kind)
    }
}

impl From<Delegate> for Action {
    fn from(delegate: Delegate) -> Self {
        Action::Delegate(delegate)
    }
}

/// One entry of a state's definition, before includes are expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDef {
    Rule {
        pattern: String,
        action: Action,
        next: Transition,
    },
    Include(String),
}

impl RuleDef {
    /// Sets the transition. Has no effect on `include` entries.
    pub fn then(self, transition: Transition) -> Self {
        match self {
            RuleDef::Rule {
                pattern, action, ..
            } => RuleDef::Rule {
                pattern,
                action,
                next: transition,
            },
            include => include,
        }
    }

    pub fn push(self, state: impl Into<String>) -> Self {
        self.then(Transition::Push(state.into()))
    }

    pub fn push_current(self) -> Self {
        self.then(Transition::PushCurrent)
    }

    pub fn push_all<I, S>(self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(Transition::PushSequence(
            states.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn pop(self) -> Self {
        self.then(Transition::Pop(1))
    }

    pub fn pop_n(self, n: usize) -> Self {
        self.then(Transition::Pop(n))
    }
}

pub fn rule(pattern: impl Into<String>, action: impl Into<Action>) -> RuleDef {
    RuleDef::Rule {
        pattern: pattern.into(),
        action: action.into(),
        next: Transition::Stay,
    }
}

pub fn include(state: impl Into<String>) -> RuleDef {
    RuleDef::Include(state.into())
}

/// A rule that always matches without consuming input and only applies `transition`.
pub fn default(transition: Transition) -> RuleDef {
    RuleDef::Rule {
        pattern: String::new(),
        action: Action::Token(TokenKind::Text),
        next: transition,
    }
}

/// One action per capture group, in group order.
pub fn bygroups<I>(groups: I) -> Action
where
    I: IntoIterator,
    I::Item: Into<GroupAction>,
{
    Action::ByGroups(groups.into_iter().map(Into::into).collect())
}

pub fn using(delegate: Delegate) -> Delegate {
    delegate
}

/// A vocabulary of literal words matched by a single alternation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Words {
    words: Vec<String>,
    prefix: String,
    suffix: String,
}

pub fn words<I, S>(vocabulary: I) -> Words
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Words {
        words: vocabulary.into_iter().map(Into::into).collect(),
        prefix: String::new(),
        suffix: String::new(),
    }
}

impl Words {
    /// Regex fragment placed before the alternation, e.g. `(?<!\.)`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Regex fragment placed after the alternation, e.g. `\b`.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// The alternation pattern. Longer words come first: alternation commits to the first
    /// branch that matches, so `IN` listed before `INSERT` would cut `INSERT` short.
    pub fn pattern(&self) -> String {
        let mut sorted: Vec<&str> = self.words.iter().map(String::as_str).collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        sorted.dedup();
        let alternation = sorted
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join("|");
        format!("{}(?:{}){}", self.prefix, alternation, self.suffix)
    }
}

impl From<Words> for String {
    fn from(words: Words) -> Self {
        words.pattern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_orders_longest_first() {
        let pattern = words(["IN", "INSERT", "IF", "IN"]).pattern();
        assert_eq!(pattern, "(?:INSERT|IF|IN)");
    }

    #[test]
    fn test_words_escapes_and_wraps() {
        let pattern = words(["POST-ACCUM", "a.b"])
            .prefix(r"(?<!\.)")
            .suffix(r"\b")
            .pattern();
        assert_eq!(pattern, r"(?<!\.)(?:POST\-ACCUM|a\.b)\b");
    }

    #[test]
    fn test_transition_helpers() {
        let def = rule("\"", TokenKind::String).push("string");
        assert_eq!(
            def,
            RuleDef::Rule {
                pattern: "\"".into(),
                action: Action::Token(TokenKind::String),
                next: Transition::Push("string".into()),
            }
        );
        assert!(matches!(
            rule("x", TokenKind::Name).pop_n(2),
            RuleDef::Rule {
                next: Transition::Pop(2),
                ..
            }
        ));
        assert_eq!(include("comment").pop(), include("comment"));
    }

    #[test]
    fn test_bygroups_accepts_mixed_actions() {
        let action = bygroups([
            GroupAction::from(TokenKind::Operator),
            using(Delegate::this()).into(),
            None::<TokenKind>.into(),
        ]);
        assert_eq!(
            action,
            Action::ByGroups(vec![
                GroupAction::Kind(TokenKind::Operator),
                GroupAction::Delegate(Delegate::this()),
                GroupAction::Skip,
            ])
        );
    }
}
