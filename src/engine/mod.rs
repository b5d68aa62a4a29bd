//! Table-driven finite state machine engine.
//!
//! The engine owns the current state, a fixed-capacity [`TransitionTable`]
//! and a bounded [`EventQueue`]. Producers push events; a single consumer
//! calls [`Engine::drain_and_dispatch`] once per control cycle.
//!
//! # Example
//!
//! ```rust
//! use junction::engine::{Dispatch, Engine};
//! use junction::traffic::{Phase, Signal};
//!
//! let mut engine: Engine<Phase, Signal> = Engine::new(Phase::Idle);
//! engine
//!     .register_transition(Phase::Idle, Phase::PhaseAHold, Signal::Start, None)
//!     .unwrap();
//!
//! engine.push_event(Signal::Start).unwrap();
//! engine.push_event(Signal::Switch).unwrap();
//! let summary = engine.drain_and_dispatch();
//!
//! assert_eq!(summary.processed, 2);
//! assert_eq!(summary.unmatched, 1);
//! assert_eq!(engine.current_state(), Phase::PhaseAHold);
//! assert!(matches!(engine.dispatch(Signal::Start), Dispatch::Unmatched { .. }));
//! ```

mod error;
mod queue;
mod table;

pub use error::FsmError;
pub use queue::{EventQueue, EventSender, RingQueue, SharedQueue, DEFAULT_QUEUE_CAPACITY};
pub use table::{Transition, TransitionTable, DEFAULT_TABLE_CAPACITY};

use crate::core::{Cause, Event, SharedAction, State, StateHistory, StateTransition};
use tracing::{debug, error, info, warn};

/// Outcome of dispatching one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch<S: State> {
    /// A row matched; its action ran and the state moved.
    Matched { from: S, to: S },

    /// No row for the current state and event; state unchanged.
    Unmatched { state: S },
}

impl<S: State> Dispatch<S> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Counts from one [`Engine::drain_and_dispatch`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub processed: usize,
    pub unmatched: usize,
}

/// Finite state machine with a registered transition table and event queue.
pub struct Engine<S: State, E: Event, Q: EventQueue<E> = RingQueue<E>> {
    current: S,
    table: TransitionTable<S, E>,
    queue: Q,
    history: StateHistory<S, E>,
}

impl<S: State, E: Event> Engine<S, E, RingQueue<E>> {
    /// Engine backed by a default-sized ring buffer.
    pub fn new(initial: S) -> Self {
        Self::with_queue(initial, RingQueue::new())
    }
}

impl<S: State, E: Event, Q: EventQueue<E>> Engine<S, E, Q> {
    /// Engine backed by the given queue and a default-sized table.
    pub fn with_queue(initial: S, queue: Q) -> Self {
        Self::from_parts(
            initial,
            TransitionTable::new(DEFAULT_TABLE_CAPACITY),
            queue,
            StateHistory::new(),
        )
    }

    pub fn from_parts(
        initial: S,
        table: TransitionTable<S, E>,
        queue: Q,
        history: StateHistory<S, E>,
    ) -> Self {
        Self {
            current: initial,
            table,
            queue,
            history,
        }
    }

    /// Set the state and clear the table, queue and history. Idempotent.
    pub fn initialize(&mut self, initial: S) {
        self.current = initial;
        self.table.clear();
        self.queue.clear();
        self.history.clear();
    }

    /// Register `(from, event) -> to`.
    ///
    /// Rows are matched in registration order, so a later row for the same
    /// `(from, event)` pair is never reached.
    pub fn register_transition(
        &mut self,
        from: S,
        to: S,
        event: E,
        action: Option<SharedAction>,
    ) -> Result<(), FsmError> {
        self.register(Transition::new(from, event, to, action))
    }

    /// Register a prebuilt row.
    pub fn register(&mut self, transition: Transition<S, E>) -> Result<(), FsmError> {
        let (from, event, to) = (transition.from, transition.event, transition.to);
        self.table.push(transition).inspect_err(|e| {
            error!(
                from = from.name(),
                event = event.name(),
                to = to.name(),
                "cannot register transition: {e}"
            );
        })
    }

    /// Queue an event for the next drain. Never blocks.
    pub fn push_event(&mut self, event: E) -> Result<(), FsmError> {
        self.queue.push(event)
    }

    /// Apply one event to the current state immediately.
    ///
    /// The matched row's action runs before the state is updated.
    pub fn dispatch(&mut self, event: E) -> Dispatch<S> {
        let from = self.current;
        let Some(transition) = self.table.find(from, event) else {
            return Dispatch::Unmatched { state: from };
        };
        let to = transition.to;

        debug!(
            from = from.name(),
            to = to.name(),
            event = event.name(),
            "transition"
        );

        if let Some(action) = &transition.action {
            action.execute();
        }

        self.current = to;
        self.history
            .record(StateTransition::now(from, to, Cause::Event(event)));
        Dispatch::Matched { from, to }
    }

    /// Dispatch every event queued at the moment of the call, in FIFO order.
    ///
    /// Events that arrive while draining wait for the next call.
    pub fn drain_and_dispatch(&mut self) -> DrainSummary {
        let pending = self.queue.len();
        let mut summary = DrainSummary::default();

        for _ in 0..pending {
            let Some(event) = self.queue.pop() else {
                break;
            };
            summary.processed += 1;
            if let Dispatch::Unmatched { state } = self.dispatch(event) {
                summary.unmatched += 1;
                warn!(
                    event = event.name(),
                    state = state.name(),
                    "no transition for event in current state"
                );
            }
        }

        summary
    }

    pub fn current_state(&self) -> S {
        self.current
    }

    /// Overwrite the current state without consulting the table.
    ///
    /// No action runs and no event is consumed. Every use is logged and
    /// kept in the history as a forced change.
    pub fn set_state(&mut self, state: S) {
        let from = self.current;
        warn!(
            from = from.name(),
            to = state.name(),
            "state forced, transition table bypassed"
        );
        self.current = state;
        self.history
            .record(StateTransition::now(from, state, Cause::Forced));
    }

    /// Force `initial` and clear the table and queue.
    ///
    /// Transitions must be registered again afterwards. The reset itself is
    /// kept as the first history record.
    pub fn reset(&mut self, initial: S) {
        let from = self.current;
        self.initialize(initial);
        self.history
            .record(StateTransition::now(from, initial, Cause::Reset));
        info!(state = initial.name(), "engine reset");
    }

    pub fn history(&self) -> &StateHistory<S, E> {
        &self.history
    }

    pub fn table(&self) -> &TransitionTable<S, E> {
        &self.table
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }
}
