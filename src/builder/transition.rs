//! Builder for constructing transition rows.

use crate::builder::error::BuildError;
use crate::core::{Event, SharedAction, State};
use crate::engine::Transition;
use std::sync::Arc;

/// Builder for constructing transitions with a fluent API.
pub struct TransitionBuilder<S: State, E: Event> {
    from: Option<S>,
    event: Option<E>,
    to: Option<S>,
    action: Option<SharedAction>,
}

impl<S: State, E: Event> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            event: None,
            to: None,
            action: None,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: E) -> Self {
        self.event = Some(event);
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Attach a shared action (optional).
    pub fn action(mut self, action: SharedAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Attach a closure as the action (optional).
    pub fn run<F>(self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.action(Arc::new(f))
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition<S, E>, BuildError> {
        let from = self.from.ok_or(BuildError::MissingFromState)?;
        let event = self.event.ok_or(BuildError::MissingEvent)?;
        let to = self.to.ok_or(BuildError::MissingToState)?;

        Ok(Transition::new(from, event, to, self.action))
    }
}

impl<S: State, E: Event> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
