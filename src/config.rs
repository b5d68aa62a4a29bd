//! TOML configuration for the controller and its runtime.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock intersection. Values are checked with [`Config::validate`],
//! which reports every problem at once instead of stopping at the first.

use crate::actuation::Street;
use crate::engine::{DEFAULT_QUEUE_CAPACITY, DEFAULT_TABLE_CAPACITY};
use crate::core::DEFAULT_HISTORY_CAPACITY;
use crate::policy::TimingPolicy;
use crate::traffic::CONTROLLER_TRANSITIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;
use tracing::error;

pub const DEFAULT_SPEED_THRESHOLD: u32 = 80;
pub const DEFAULT_CYCLE_PERIOD_MS: u64 = 10;
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_INBOX_CAPACITY: usize = 32;
pub const DEFAULT_COMMAND_CAPACITY: usize = 10;
pub const DEFAULT_ACTUATOR_SEND_TIMEOUT_MS: u64 = 100;

/// Parameters of the phase controller itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub timing: TimingPolicy,
    /// Street given green while an emergency vehicle is present.
    pub priority_street: Street,
    /// Speeds strictly above this open the pump.
    pub speed_threshold: u32,
    pub table_capacity: usize,
    pub history_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timing: TimingPolicy::default(),
            priority_street: Street::A,
            speed_threshold: DEFAULT_SPEED_THRESHOLD,
            table_capacity: DEFAULT_TABLE_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Task periods and channel sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub cycle_period_ms: u64,
    pub status_interval_ms: u64,
    pub inbox_capacity: usize,
    pub command_capacity: usize,
    pub queue_capacity: usize,
    pub actuator_send_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: DEFAULT_CYCLE_PERIOD_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            actuator_send_timeout_ms: DEFAULT_ACTUATOR_SEND_TIMEOUT_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub runtime: RuntimeConfig,
}

/// A single rejected configuration value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("table_capacity ({capacity}) cannot hold the {required} controller transitions")]
    TableTooSmall { capacity: usize, required: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration rejected with {} violation(s)", .violations.len())]
    Invalid { violations: Vec<ConfigViolation> },
}

fn nonzero(field: &'static str, value: u64) -> Validation<(), NonEmptyVec<ConfigViolation>> {
    if value > 0 {
        Validation::success(())
    } else {
        Validation::fail(ConfigViolation::Zero { field })
    }
}

impl Config {
    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        match config.validate() {
            Validation::Success(_) => Ok(config),
            Validation::Failure(errors) => {
                for violation in errors.iter() {
                    error!("invalid configuration: {violation}");
                }
                Err(ConfigError::Invalid {
                    violations: errors.iter().cloned().collect(),
                })
            }
        }
    }

    /// Check every value, accumulating all violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let timing = &self.controller.timing;
        let runtime = &self.runtime;
        let capacity = self.controller.table_capacity;

        let checks = vec![
            nonzero("timing.base_minimum_ms", timing.base_minimum_ms),
            nonzero("timing.yellow_ms", timing.yellow_ms),
            nonzero("runtime.cycle_period_ms", runtime.cycle_period_ms),
            nonzero("runtime.status_interval_ms", runtime.status_interval_ms),
            nonzero("runtime.inbox_capacity", runtime.inbox_capacity as u64),
            nonzero("runtime.command_capacity", runtime.command_capacity as u64),
            nonzero("runtime.queue_capacity", runtime.queue_capacity as u64),
            if capacity >= CONTROLLER_TRANSITIONS {
                Validation::success(())
            } else {
                Validation::fail(ConfigViolation::TableTooSmall {
                    capacity,
                    required: CONTROLLER_TRANSITIONS,
                })
            },
        ];

        Validation::all_vec(checks).map(|_| ())
    }
}
