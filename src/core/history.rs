//! Bounded audit trail of state changes.
//!
//! Every state change the engine makes is recorded here, whether it came
//! from a matched transition, a forced override or a reset. The trail is
//! preallocated with a fixed capacity; once full, the oldest record is
//! evicted so memory use never grows after initialization.

use super::state::{Event, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records kept by [`StateHistory::new`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Why the current state changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum Cause<E: Event> {
    /// A registered transition matched this event.
    Event(E),
    /// `set_state` overwrote the state without consulting the table.
    Forced,
    /// The engine was reset or initialized.
    Reset,
}

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use junction::core::{Cause, StateTransition};
/// use junction::traffic::{Phase, Signal};
/// use chrono::Utc;
///
/// let record = StateTransition {
///     from: Phase::Idle,
///     to: Phase::PhaseAHold,
///     cause: Cause::Event(Signal::Start),
///     timestamp: Utc::now(),
/// };
/// assert!(!record.is_forced());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State, E: Event> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// What triggered the change
    pub cause: Cause<E>,
    /// When the change occurred
    pub timestamp: DateTime<Utc>,
}

impl<S: State, E: Event> StateTransition<S, E> {
    /// Build a record stamped with the current time.
    pub fn now(from: S, to: S, cause: Cause<E>) -> Self {
        Self {
            from,
            to,
            cause,
            timestamp: Utc::now(),
        }
    }

    /// True when the change bypassed the transition table.
    pub fn is_forced(&self) -> bool {
        matches!(self.cause, Cause::Forced)
    }
}

/// Ordered, bounded history of state changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State, E: Event> {
    capacity: usize,
    transitions: VecDeque<StateTransition<S, E>>,
}

impl<S: State, E: Event> Default for StateHistory<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State, E: Event> StateHistory<S, E> {
    /// Create an empty history holding [`DEFAULT_HISTORY_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding at most `capacity` records.
    ///
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition<S, E>) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Drop every record, keeping the allocation.
    pub fn clear(&mut self) {
        self.transitions.clear();
    }

    /// Get the path of states traversed by the retained records.
    ///
    /// Returns the `from` state of the oldest record followed by the `to`
    /// state of each record.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Elapsed time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Records that bypassed the transition table, oldest first.
    pub fn forced(&self) -> impl Iterator<Item = &StateTransition<S, E>> {
        self.transitions.iter().filter(|t| t.is_forced())
    }

    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition<S, E>> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
