//! Two-street intersection built on the engine.
//!
//! [`Phase`] and [`Signal`] are the controller's state and event tags;
//! [`Controller`] wires them into a transition table whose actions emit
//! actuation commands.

mod controller;
mod phase;

pub use controller::{
    cycle_transitions, ControlMessage, Controller, TimerTicket, TrafficContext,
    CONTROLLER_TRANSITIONS,
};
pub use phase::{Phase, Signal};
