//! Builder API for ergonomic engine construction.
//!
//! This module provides fluent builders and macros for creating engines
//! and transition tables with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;
pub mod transition;

pub use error::BuildError;
pub use machine::EngineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{Event, State};
use crate::engine::Transition;

/// Create a transition without an action.
///
/// # Example
///
/// ```
/// use junction::builder::simple_transition;
/// use junction::traffic::{Phase, Signal};
///
/// let transition = simple_transition(Phase::Idle, Signal::Start, Phase::PhaseAHold);
/// assert!(transition.matches(Phase::Idle, Signal::Start));
/// ```
pub fn simple_transition<S: State, E: Event>(from: S, event: E, to: S) -> Transition<S, E> {
    Transition::new(from, event, to, None)
}
