//! Physical output drivers.
//!
//! Actuator tasks own a driver and never touch hardware any other way.

use crate::actuation::lights::LightPattern;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Writes outputs to hardware (or a stand-in).
pub trait OutputDriver: Send + 'static {
    fn write_lights(&mut self, pattern: LightPattern);

    fn write_pump(&mut self, open: bool);
}

/// Driver that reports every write through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDriver;

impl OutputDriver for LogDriver {
    fn write_lights(&mut self, pattern: LightPattern) {
        info!(street_a = ?pattern.street_a, street_b = ?pattern.street_b, "lights");
    }

    fn write_pump(&mut self, open: bool) {
        info!(open, "pump");
    }
}

/// Driver that keeps every write in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryDriver {
    pub lights: Vec<LightPattern>,
    pub pump: Vec<bool>,
}

impl OutputDriver for MemoryDriver {
    fn write_lights(&mut self, pattern: LightPattern) {
        self.lights.push(pattern);
    }

    fn write_pump(&mut self, open: bool) {
        self.pump.push(open);
    }
}

/// A driver shared with an observer, e.g. a test inspecting writes while
/// an actuator task owns the other handle.
impl<D: OutputDriver> OutputDriver for Arc<Mutex<D>> {
    fn write_lights(&mut self, pattern: LightPattern) {
        match self.lock() {
            Ok(mut driver) => driver.write_lights(pattern),
            Err(poisoned) => poisoned.into_inner().write_lights(pattern),
        }
    }

    fn write_pump(&mut self, open: bool) {
        match self.lock() {
            Ok(mut driver) => driver.write_pump(open),
            Err(poisoned) => poisoned.into_inner().write_pump(open),
        }
    }
}
