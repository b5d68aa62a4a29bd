//! Adaptive green-phase timing.
//!
//! A HOLD phase lasts `base_minimum_ms`, plus `extra_per_vehicle_ms` for
//! every vehicle counted above `count_threshold`. The extension has no upper
//! bound. Yellow phases always last `yellow_ms`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_MINIMUM_MS: u64 = 30_000;
pub const DEFAULT_EXTRA_PER_VEHICLE_MS: u64 = 3_000;
pub const DEFAULT_COUNT_THRESHOLD: u32 = 9;
pub const DEFAULT_YELLOW_MS: u64 = 5_000;

/// Phase duration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingPolicy {
    pub base_minimum_ms: u64,
    pub extra_per_vehicle_ms: u64,
    pub count_threshold: u32,
    pub yellow_ms: u64,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            base_minimum_ms: DEFAULT_BASE_MINIMUM_MS,
            extra_per_vehicle_ms: DEFAULT_EXTRA_PER_VEHICLE_MS,
            count_threshold: DEFAULT_COUNT_THRESHOLD,
            yellow_ms: DEFAULT_YELLOW_MS,
        }
    }
}

impl TimingPolicy {
    /// Green hold duration for the given vehicle count (pure).
    ///
    /// Never below `base_minimum_ms`. Arithmetic saturates at `u64::MAX`
    /// rather than wrapping.
    ///
    /// ```rust
    /// use junction::policy::TimingPolicy;
    ///
    /// let policy = TimingPolicy::default();
    /// assert_eq!(policy.hold_duration_ms(0), 30_000);
    /// assert_eq!(policy.hold_duration_ms(9), 30_000);
    /// assert_eq!(policy.hold_duration_ms(10), 33_000);
    /// ```
    pub fn hold_duration_ms(&self, vehicle_count: u32) -> u64 {
        self.base_minimum_ms
            .saturating_add(self.extra_duration_ms(vehicle_count))
    }

    /// Extension above the base for the given count; zero at or below the
    /// threshold.
    pub fn extra_duration_ms(&self, vehicle_count: u32) -> u64 {
        let excess = vehicle_count.saturating_sub(self.count_threshold);
        self.extra_per_vehicle_ms.saturating_mul(u64::from(excess))
    }

    /// Extension hint stored alongside a count update, only when the count
    /// exceeds the threshold.
    pub fn extra_duration_hint_ms(&self, vehicle_count: u32) -> Option<u64> {
        (vehicle_count > self.count_threshold).then(|| self.extra_duration_ms(vehicle_count))
    }

    pub fn yellow_duration_ms(&self) -> u64 {
        self.yellow_ms
    }
}
