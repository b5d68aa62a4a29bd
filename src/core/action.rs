//! Transition side effects.
//!
//! An action runs synchronously while a transition is applied, before the
//! engine moves to the target state. Actions are shared (`Arc`) between the
//! caller and the transition table, so one action can be registered on many
//! rows without copying it.

use std::sync::Arc;

/// A side effect executed during a matched transition.
///
/// Any `Fn()` closure that is `Send + Sync` is an action.
///
/// # Example
///
/// ```rust
/// use junction::core::{Action, SharedAction};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let action: SharedAction = Arc::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// action.execute();
/// action.execute();
/// assert_eq!(hits.load(Ordering::SeqCst), 2);
/// ```
pub trait Action: Send + Sync {
    /// Perform the side effect.
    fn execute(&self);
}

impl<F> Action for F
where
    F: Fn() + Send + Sync,
{
    fn execute(&self) {
        self()
    }
}

/// Reference-counted action handle stored in transition rows.
pub type SharedAction = Arc<dyn Action>;

/// Wrap a closure into a [`SharedAction`].
pub fn action<F>(f: F) -> SharedAction
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Runs a fixed list of actions in order.
pub struct Sequence {
    steps: Vec<SharedAction>,
}

impl Sequence {
    pub fn new(steps: Vec<SharedAction>) -> Self {
        Self { steps }
    }

    pub fn shared(steps: Vec<SharedAction>) -> SharedAction {
        Arc::new(Self::new(steps))
    }
}

impl Action for Sequence {
    fn execute(&self) {
        for step in &self.steps {
            step.execute();
        }
    }
}
