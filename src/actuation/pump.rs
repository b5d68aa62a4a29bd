//! Pump valve driven by vehicle speed reports.

use crate::actuation::driver::OutputDriver;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpCommand {
    Open,
    Close,
}

impl PumpCommand {
    /// Open when `speed` is strictly above `threshold`.
    pub fn for_speed(speed: u32, threshold: u32) -> Self {
        if speed > threshold {
            Self::Open
        } else {
            Self::Close
        }
    }
}

/// Tracks the valve position and writes only on change.
pub struct PumpValve<D: OutputDriver> {
    driver: D,
    open: bool,
}

impl<D: OutputDriver> PumpValve<D> {
    /// Start closed.
    pub fn new(mut driver: D) -> Self {
        driver.write_pump(false);
        Self {
            driver,
            open: false,
        }
    }

    pub fn apply(&mut self, command: PumpCommand) {
        let open = command == PumpCommand::Open;
        if open == self.open {
            debug!(open, "pump already in requested position");
            return;
        }
        self.driver.write_pump(open);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::driver::MemoryDriver;

    #[test]
    fn speed_threshold_is_strict() {
        assert_eq!(PumpCommand::for_speed(80, 80), PumpCommand::Close);
        assert_eq!(PumpCommand::for_speed(81, 80), PumpCommand::Open);
        assert_eq!(PumpCommand::for_speed(0, 80), PumpCommand::Close);
    }

    #[test]
    fn valve_writes_only_on_change() {
        let mut valve = PumpValve::new(MemoryDriver::default());
        valve.apply(PumpCommand::Close);
        valve.apply(PumpCommand::Open);
        valve.apply(PumpCommand::Open);
        valve.apply(PumpCommand::Close);

        assert!(!valve.is_open());
        assert_eq!(valve.driver().pump, vec![false, true, false]);
    }
}
