//! Transition rows and the fixed-capacity table that holds them.

use crate::core::{Event, SharedAction, State};
use crate::engine::error::FsmError;
use std::fmt;

/// Number of rows a table accepts unless configured otherwise.
pub const DEFAULT_TABLE_CAPACITY: usize = 32;

/// One row of the transition table: `(from, event) -> to`, with an optional
/// side effect run before the state changes.
#[derive(Clone)]
pub struct Transition<S: State, E: Event> {
    pub from: S,
    pub event: E,
    pub to: S,
    pub action: Option<SharedAction>,
}

impl<S: State, E: Event> Transition<S, E> {
    pub fn new(from: S, event: E, to: S, action: Option<SharedAction>) -> Self {
        Self {
            from,
            event,
            to,
            action,
        }
    }

    /// Check if this row applies to the given state and event (pure)
    pub fn matches(&self, state: S, event: E) -> bool {
        self.from == state && self.event == event
    }
}

impl<S: State, E: Event> fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("event", &self.event)
            .field("to", &self.to)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// Registration-ordered list of transitions with a hard capacity.
///
/// Storage is allocated once in [`TransitionTable::new`] and never grows.
/// Lookup is a linear scan; the first matching row wins.
pub struct TransitionTable<S: State, E: Event> {
    capacity: usize,
    rows: Vec<Transition<S, E>>,
}

impl<S: State, E: Event> TransitionTable<S, E> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row, failing once every slot is taken.
    pub fn push(&mut self, transition: Transition<S, E>) -> Result<(), FsmError> {
        if self.rows.len() >= self.capacity {
            return Err(FsmError::TableFull {
                capacity: self.capacity,
            });
        }
        self.rows.push(transition);
        Ok(())
    }

    /// First row registered for `(state, event)`, if any.
    pub fn find(&self, state: S, event: E) -> Option<&Transition<S, E>> {
        self.rows.iter().find(|t| t.matches(state, event))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn rows(&self) -> &[Transition<S, E>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<S: State, E: Event> Default for TransitionTable<S, E> {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_CAPACITY)
    }
}
