//! Builder for constructing engines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Event, State, StateHistory, DEFAULT_HISTORY_CAPACITY};
use crate::engine::{Engine, EventQueue, Transition, TransitionTable, DEFAULT_TABLE_CAPACITY};

/// Builder for constructing engines with a fluent API.
pub struct EngineBuilder<S: State, E: Event, Q: EventQueue<E>> {
    initial: Option<S>,
    queue: Option<Q>,
    table_capacity: usize,
    history_capacity: usize,
    transitions: Vec<Transition<S, E>>,
}

impl<S: State, E: Event, Q: EventQueue<E>> EngineBuilder<S, E, Q> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            queue: None,
            table_capacity: DEFAULT_TABLE_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            transitions: Vec::new(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the event queue backing (required).
    pub fn queue(mut self, queue: Q) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Override the transition table capacity.
    pub fn table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }

    /// Override the number of retained history records.
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder<S, E>) -> Result<Self, BuildError> {
        let transition = builder.build()?;
        self.transitions.push(transition);
        Ok(self)
    }

    /// Add multiple transitions at once, keeping their order.
    pub fn transitions(mut self, transitions: Vec<Transition<S, E>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Build the engine, registering every transition in order.
    pub fn build(self) -> Result<Engine<S, E, Q>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let queue = self.queue.ok_or(BuildError::MissingQueue)?;

        let mut engine = Engine::from_parts(
            initial,
            TransitionTable::new(self.table_capacity),
            queue,
            StateHistory::with_capacity(self.history_capacity),
        );
        for transition in self.transitions {
            engine.register(transition)?;
        }

        Ok(engine)
    }
}

impl<S: State, E: Event, Q: EventQueue<E>> Default for EngineBuilder<S, E, Q> {
    fn default() -> Self {
        Self::new()
    }
}
