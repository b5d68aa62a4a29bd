//! Core state machine types.
//!
//! This module contains the vocabulary shared by the engine and every
//! machine built on it:
//! - State and event tags via the `State` and `Event` traits
//! - Transition side effects via the `Action` trait
//! - A bounded audit trail of state changes

mod action;
mod history;
mod state;

pub use action::{action, Action, Sequence, SharedAction};
pub use history::{Cause, StateHistory, StateTransition, DEFAULT_HISTORY_CAPACITY};
pub use state::{Event, State};
