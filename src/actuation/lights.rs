//! Signal heads for the two conflicting streets.

use crate::actuation::driver::OutputDriver;
use crate::actuation::{ActuationError, Command};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// One of the two streets sharing the intersection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    #[default]
    A,
    B,
}

impl Street {
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

/// Lamp lit on a signal head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lamp {
    Off,
    Red,
    Yellow,
    Green,
}

/// Output configuration for both signal heads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LightPattern {
    pub street_a: Lamp,
    pub street_b: Lamp,
}

impl LightPattern {
    pub const ALL_OFF: Self = Self {
        street_a: Lamp::Off,
        street_b: Lamp::Off,
    };

    pub const ALL_RED: Self = Self {
        street_a: Lamp::Red,
        street_b: Lamp::Red,
    };

    /// `street` shows `lamp`, the competing street is held red.
    pub fn only(street: Street, lamp: Lamp) -> Self {
        match street {
            Street::A => Self {
                street_a: lamp,
                street_b: Lamp::Red,
            },
            Street::B => Self {
                street_a: Lamp::Red,
                street_b: lamp,
            },
        }
    }

    pub fn lamp(&self, street: Street) -> Lamp {
        match street {
            Street::A => self.street_a,
            Street::B => self.street_b,
        }
    }

    /// False when both streets would be green at once.
    pub fn is_conflict_free(&self) -> bool {
        !(self.street_a == Lamp::Green && self.street_b == Lamp::Green)
    }
}

/// Applies light commands to a driver, refusing conflicting patterns.
pub struct LightBank<D: OutputDriver> {
    driver: D,
    current: LightPattern,
}

impl<D: OutputDriver> LightBank<D> {
    /// Start with every lamp dark.
    pub fn new(mut driver: D) -> Self {
        driver.write_lights(LightPattern::ALL_OFF);
        Self {
            driver,
            current: LightPattern::ALL_OFF,
        }
    }

    pub fn apply(&mut self, command: &Command) -> Result<(), ActuationError> {
        match command {
            Command::SetLights(pattern) => self.show(*pattern),
            Command::AllSafe => self.show(LightPattern::ALL_RED),
            Command::AllOff => self.show(LightPattern::ALL_OFF),
            Command::ResumeNormal => {
                info!("preemption released, resuming normal phase control");
                Ok(())
            }
            Command::ArmTimeout { .. } | Command::Pump(_) => {
                debug!(?command, "not a light command, ignored");
                Ok(())
            }
        }
    }

    fn show(&mut self, pattern: LightPattern) -> Result<(), ActuationError> {
        if !pattern.is_conflict_free() {
            error!(?pattern, current = ?self.current, "refusing conflicting greens");
            return Err(ActuationError::ConflictingGreens(pattern));
        }
        self.driver.write_lights(pattern);
        self.current = pattern;
        Ok(())
    }

    pub fn current(&self) -> LightPattern {
        self.current
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}
