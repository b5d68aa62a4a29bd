//! Abstract command interface between the controller and physical outputs.
//!
//! Transition actions never drive hardware. They emit [`Command`]s into a
//! [`CommandSink`]; actuator tasks on the other side own the drivers.

mod driver;
mod lights;
mod pump;

pub use driver::{LogDriver, MemoryDriver, OutputDriver};
pub use lights::{Lamp, LightBank, LightPattern, Street};
pub use pump::{PumpCommand, PumpValve};

use crate::traffic::Phase;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Side effect requested by a transition action or the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Show a phase's output configuration.
    SetLights(LightPattern),
    /// Fire a timeout for `phase` after `after_ms`. `generation` identifies
    /// the arm so stale timers can be told apart from the latest one.
    ArmTimeout {
        phase: Phase,
        after_ms: u64,
        generation: u64,
    },
    /// Every street red.
    AllSafe,
    /// Every lamp dark.
    AllOff,
    /// Preemption released; normal phases take over again.
    ResumeNormal,
    Pump(PumpCommand),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuationError {
    #[error("light pattern {0:?} would show green on both streets")]
    ConflictingGreens(LightPattern),
}

/// Receiver of actuation commands. Must not block the caller.
pub trait CommandSink: Send + Sync {
    fn send(&self, command: Command);
}

/// Sink backed by a bounded channel to the command router task.
#[derive(Clone, Debug)]
pub struct CommandBus {
    tx: mpsc::Sender<Command>,
}

impl CommandBus {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }
}

impl CommandSink for CommandBus {
    fn send(&self, command: Command) {
        match self.tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                warn!(?command, "command queue full, command dropped");
            }
            Err(TrySendError::Closed(command)) => {
                warn!(?command, "command router gone, command dropped");
            }
        }
    }
}

/// Sink that keeps every command in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<Command>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<Command> {
        match self.commands.lock() {
            Ok(mut commands) => std::mem::take(&mut *commands),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl CommandSink for RecordingSink {
    fn send(&self, command: Command) {
        match self.commands.lock() {
            Ok(mut commands) => commands.push(command),
            Err(poisoned) => poisoned.into_inner().push(command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_takes_in_order() {
        let sink = RecordingSink::new();
        sink.send(Command::AllSafe);
        sink.send(Command::ResumeNormal);

        assert_eq!(sink.take(), vec![Command::AllSafe, Command::ResumeNormal]);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn command_bus_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let bus = CommandBus::new(tx);

        bus.send(Command::AllSafe);
        bus.send(Command::AllOff);

        assert_eq!(rx.try_recv().unwrap(), Command::AllSafe);
        assert!(rx.try_recv().is_err());
    }
}
