//! State and event tags driven through the engine.
//!
//! Both are small closed sets of `Copy` values. Neither trait carries
//! behaviour beyond naming and classification; everything that happens on a
//! transition lives in [`Action`](super::Action).

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure. Exactly one state is current inside an
/// [`Engine`](crate::engine::Engine) at any time.
///
/// # Example
///
/// ```rust
/// use junction::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
/// enum DoorState {
///     Closed,
///     Open,
///     Jammed,
/// }
///
/// impl State for DoorState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Closed => "Closed",
///             Self::Open => "Open",
///             Self::Jammed => "Jammed",
///         }
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Jammed)
///     }
/// }
///
/// assert!(DoorState::Jammed.is_error());
/// assert!(!DoorState::Open.is_final());
/// ```
pub trait State:
    Copy + Eq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// Trait for events consumed by the engine.
///
/// Events are copied into the queue and consumed exactly once.
pub trait Event:
    Copy + Eq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the event's name for display/logging.
    fn name(&self) -> &str;
}
