//! Engine failure conditions.
//!
//! None of these are fatal to the process. `TableFull` is a configuration
//! error reported once at startup, `QueueFull` drops a single event, and
//! `QueueInit` stops only the task that owns the queue.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("transition table full: all {capacity} slots are registered")]
    TableFull { capacity: usize },

    #[error("event queue full ({capacity} pending), discarded event '{event}'")]
    QueueFull { capacity: usize, event: String },

    #[error("event queue could not be created: {reason}")]
    QueueInit { reason: String },
}
