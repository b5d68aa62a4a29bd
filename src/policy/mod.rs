//! Traffic policies layered on the engine.

mod emergency;
mod timing;

pub use emergency::EmergencyPolicy;
pub use timing::{
    TimingPolicy, DEFAULT_BASE_MINIMUM_MS, DEFAULT_COUNT_THRESHOLD, DEFAULT_EXTRA_PER_VEHICLE_MS,
    DEFAULT_YELLOW_MS,
};
