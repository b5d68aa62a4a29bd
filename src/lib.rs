//! Junction: an event-driven state machine core for a two-street intersection
//!
//! The crate has two layers. A generic engine ([`engine`]) keeps a
//! fixed-capacity transition table and a bounded event queue; producers push
//! events and one consumer drains them once per control cycle, running each
//! matched row's action before the state changes. The traffic layer
//! ([`traffic`], [`policy`]) registers the four-phase cycle on that engine,
//! sizes green phases from live vehicle counts and preempts the cycle for
//! emergency vehicles.
//!
//! Actions never touch hardware: they emit [`actuation::Command`]s that
//! actuator tasks apply through an [`actuation::OutputDriver`].
//!
//! # Core Concepts
//!
//! - **State / Event**: `Copy` tags via the [`State`] and [`Event`] traits
//! - **Action**: side effects attached to transitions via [`Action`]
//! - **History**: a bounded audit trail of every state change
//!
//! # Example
//!
//! ```rust
//! use junction::actuation::{Command, RecordingSink};
//! use junction::config::ControllerConfig;
//! use junction::engine::RingQueue;
//! use junction::traffic::{ControlMessage, Controller, Phase, Signal};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(RecordingSink::new());
//! let mut controller =
//!     Controller::new(ControllerConfig::default(), sink.clone(), RingQueue::<Signal>::new())
//!         .unwrap();
//!
//! controller.handle(ControlMessage::Signal(Signal::Start));
//! controller.cycle();
//!
//! assert_eq!(controller.phase(), Phase::PhaseAHold);
//! assert!(sink
//!     .take()
//!     .iter()
//!     .any(|c| matches!(c, Command::ArmTimeout { after_ms: 30_000, .. })));
//! ```

pub mod actuation;
pub mod builder;
pub mod config;
pub mod core;
pub mod engine;
pub mod policy;
pub mod remote;
pub mod runtime;
pub mod status;
pub mod traffic;

// Re-export commonly used types
pub use crate::builder::{BuildError, EngineBuilder, TransitionBuilder};
pub use crate::core::{Action, Event, State, StateHistory, StateTransition};
pub use crate::engine::{Dispatch, Engine, EventQueue, FsmError};
