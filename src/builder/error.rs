//! Build errors for engine and transition builders.

use crate::engine::FsmError;
use thiserror::Error;

/// Errors that can occur when building engines and transitions.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingToState,

    #[error("Event queue not specified. Call .queue(queue) before .build()")]
    MissingQueue,

    #[error(transparent)]
    Engine(#[from] FsmError),
}
