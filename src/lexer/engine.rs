//! State Stack Engine
//!
//!     The engine scans the input left to right. At every step it tries the rules of the
//!     state on top of the stack in table order and applies the first one that matches at the
//!     cursor: the rule's action emits tokens covering exactly the matched span, its transition
//!     updates the stack, and the cursor moves past the match. Priority is table order, never
//!     longest match.
//!
//!     When no rule matches, one character is emitted as an `Error` token and scanning goes
//!     on, so any input produces a complete token sequence. States left on the stack at the
//!     end of input are dropped.
//!
//! Output
//!
//!     [Tokens] is a pull-based iterator. A step only runs when the consumer asks for a token
//!     and the pending buffer is empty, so stopping early costs nothing past the last delivered
//!     token. Grouped matches buffer the tokens of one match; delegated spans are themselves
//!     lazy [Tokens] over the sub-slice, shifted back into the caller's offsets as they are
//!     pulled.
//!
//! Progress
//!
//!     A rule that can match the empty string while staying in place is rejected when the
//!     table is built. Zero-width matches that change state are legal (`default`), but only
//!     [MAX_ZERO_WIDTH_STEPS] of them may run back to back at one position; after that they
//!     are skipped and the step falls through to the next rule or to error recovery.

use super::rules::{Action, Delegate, DelegateTarget, GroupAction};
use super::table::{Next, Rule, RuleTable, StateId};
use super::token::{Token, TokenKind};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::Range;
use tracing::{trace, warn};

pub const MAX_ZERO_WIDTH_STEPS: usize = 32;

enum Pending<'t> {
    Token(Token),
    Nested {
        offset: usize,
        tokens: Box<Tokens<'t>>,
    },
}

/// Lazy token sequence for one tokenization call.
pub struct Tokens<'t> {
    table: &'t RuleTable,
    text: &'t str,
    cursor: usize,
    stack: Vec<StateId>,
    pending: VecDeque<Pending<'t>>,
    delegate_depth: usize,
    zero_width_steps: usize,
}

impl<'t> Tokens<'t> {
    pub(crate) fn new(table: &'t RuleTable, text: &'t str, initial: StateId) -> Self {
        Self::nested(table, text, initial, 0)
    }

    fn nested(table: &'t RuleTable, text: &'t str, initial: StateId, depth: usize) -> Self {
        Tokens {
            table,
            text,
            cursor: 0,
            stack: vec![initial],
            pending: VecDeque::new(),
            delegate_depth: depth,
            zero_width_steps: 0,
        }
    }

    /// Byte offset of the next unconsumed input.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Names of the active states, bottom first.
    pub fn state_stack(&self) -> Vec<&'t str> {
        let table = self.table;
        self.stack
            .iter()
            .map(|&id| table.state_at(id).name())
            .collect()
    }

    fn top(&self) -> StateId {
        self.stack.last().copied().unwrap_or_else(|| self.table.root())
    }

    fn step(&mut self) {
        let table = self.table;
        let top = self.top();
        for rule in table.state_at(top).rules() {
            let rule: &'t Rule = rule;
            let Some(matched) = self.try_rule(rule) else {
                continue;
            };
            if matched.end == self.cursor {
                if self.zero_width_steps >= MAX_ZERO_WIDTH_STEPS {
                    continue;
                }
                self.zero_width_steps += 1;
            } else {
                self.zero_width_steps = 0;
            }
            let end = matched.end;
            self.emit(rule, matched);
            self.apply(&rule.next, top);
            self.cursor = end;
            return;
        }
        self.recover();
    }

    /// Runs the rule's pattern at the cursor. Only grouped actions need capture spans.
    fn try_rule(&self, rule: &Rule) -> Option<Match> {
        match rule.action {
            Action::ByGroups(_) => {
                let m = rule.pattern.captures_at(self.text, self.cursor)?;
                Some(Match {
                    end: m.span.end,
                    groups: m.groups,
                })
            }
            _ => rule.pattern.match_at(self.text, self.cursor).map(|end| Match {
                end,
                groups: Vec::new(),
            }),
        }
    }

    fn emit(&mut self, rule: &'t Rule, matched: Match) {
        let span = self.cursor..matched.end;
        match &rule.action {
            Action::Token(kind) => self.push_token(*kind, span),
            Action::Delegate(delegate) => self.delegate(delegate, span),
            Action::ByGroups(groups) => {
                let mut covered = span.start;
                for (action, group) in groups.iter().zip(matched.groups) {
                    let Some(group) = group else {
                        continue;
                    };
                    if group.end <= covered {
                        continue;
                    }
                    let start = group.start.max(covered);
                    self.push_token(TokenKind::Text, covered..start);
                    match action {
                        GroupAction::Kind(kind) => self.push_token(*kind, start..group.end),
                        GroupAction::Delegate(delegate) => {
                            self.delegate(delegate, start..group.end)
                        }
                        GroupAction::Skip => self.push_token(TokenKind::Text, start..group.end),
                    }
                    covered = group.end;
                }
                self.push_token(TokenKind::Text, covered..span.end);
            }
        }
    }

    fn delegate(&mut self, delegate: &'t Delegate, span: Range<usize>) {
        if span.is_empty() {
            return;
        }
        if self.delegate_depth >= self.table.options().run.max_delegate_depth {
            warn!(
                table = %self.table.name(),
                depth = self.delegate_depth,
                "delegation depth limit reached, emitting span as text"
            );
            self.push_token(TokenKind::Text, span);
            return;
        }
        let target: &'t RuleTable = match &delegate.target {
            DelegateTarget::This => self.table,
            DelegateTarget::Table(table) => table.as_ref(),
        };
        let initial = delegate
            .state
            .as_deref()
            .and_then(|name| target.state_id(name))
            .unwrap_or_else(|| target.root());
        let text = self.text;
        let tokens = Tokens::nested(target, &text[span.clone()], initial, self.delegate_depth + 1);
        self.pending.push_back(Pending::Nested {
            offset: span.start,
            tokens: Box::new(tokens),
        });
    }

    fn apply(&mut self, next: &Next, top: StateId) {
        match next {
            Next::Stay => {}
            Next::Push(state) => self.push_state(*state),
            Next::PushCurrent => self.push_state(top),
            Next::Pop(n) => {
                let keep = self.stack.len().saturating_sub(*n).max(1);
                self.stack.truncate(keep);
                trace!(depth = self.stack.len(), "popped states");
            }
            Next::PushSequence(states) => {
                for state in states {
                    self.push_state(*state);
                }
            }
        }
    }

    fn push_state(&mut self, state: StateId) {
        let limit = self.table.options().run.max_stack_depth;
        if self.stack.len() >= limit {
            warn!(
                table = %self.table.name(),
                state = %self.table.state_at(state).name(),
                limit,
                "state stack limit reached, push ignored"
            );
            return;
        }
        self.stack.push(state);
        trace!(state = %self.table.state_at(state).name(), depth = self.stack.len(), "pushed state");
    }

    /// No rule matched: classify one character and move on.
    fn recover(&mut self) {
        let Some(ch) = self.text[self.cursor..].chars().next() else {
            return;
        };
        let span = self.cursor..self.cursor + ch.len_utf8();
        if ch == '\n' && self.table.options().run.reset_on_newline {
            self.stack.truncate(1);
            self.push_token(TokenKind::Whitespace, span.clone());
        } else {
            self.push_token(TokenKind::Error, span.clone());
        }
        self.cursor = span.end;
        self.zero_width_steps = 0;
    }

    fn push_token(&mut self, kind: TokenKind, span: Range<usize>) {
        if !span.is_empty() {
            self.pending.push_back(Pending::Token(Token::new(kind, span)));
        }
    }

    fn next_pending(&mut self) -> Option<Token> {
        loop {
            match self.pending.pop_front()? {
                Pending::Token(token) => return Some(token),
                Pending::Nested { offset, mut tokens } => {
                    if let Some(token) = tokens.next() {
                        self.pending.push_front(Pending::Nested { offset, tokens });
                        return Some(token.shifted(offset));
                    }
                }
            }
        }
    }
}

struct Match {
    end: usize,
    groups: Vec<Option<Range<usize>>>,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.next_pending() {
                return Some(token);
            }
            if self.cursor >= self.text.len() {
                return None;
            }
            self.step();
        }
    }
}

impl FusedIterator for Tokens<'_> {}
