//! Ambulance presence edge detection.
//!
//! Presence reports arrive repeatedly; only changes of the last known value
//! produce events. A rising edge requests preemption, a falling edge
//! releases it. An edge counts as known only once its event was accepted,
//! and after each drain the known value is realigned with the phase the
//! engine actually reached.

use crate::traffic::Signal;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmergencyPolicy {
    present: bool,
}

impl EmergencyPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The event a report calls for, without recording it.
    pub fn edge(&self, present: bool) -> Option<Signal> {
        if present == self.present {
            debug!(present, "ambulance report unchanged, nothing to push");
            return None;
        }
        Some(if present {
            Signal::Emergency
        } else {
            Signal::ClearEmergency
        })
    }

    /// Record a report whose event was accepted by the queue.
    pub fn commit(&mut self, present: bool) {
        self.present = present;
    }

    /// Feed one report and record it unconditionally.
    pub fn observe(&mut self, present: bool) -> Option<Signal> {
        let signal = self.edge(present)?;
        self.commit(present);
        Some(signal)
    }

    /// Align the known presence with whether the cycle is preempted.
    pub fn settle(&mut self, preempted: bool) {
        if self.present != preempted {
            debug!(
                known = self.present,
                preempted, "ambulance edge did not take effect"
            );
            self.present = preempted;
        }
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Forget the last known presence.
    pub fn reset(&mut self) {
        self.present = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rising_edge_pushes_emergency_once() {
        let mut policy = EmergencyPolicy::new();
        assert_eq!(policy.observe(true), Some(Signal::Emergency));
        assert_eq!(policy.observe(true), None);
        assert!(policy.is_present());
    }

    #[test]
    fn clear_without_detection_is_silent() {
        let mut policy = EmergencyPolicy::new();
        assert_eq!(policy.observe(false), None);
    }

    #[test]
    fn falling_edge_pushes_clear() {
        let mut policy = EmergencyPolicy::new();
        policy.observe(true);
        assert_eq!(policy.observe(false), Some(Signal::ClearEmergency));
        assert_eq!(policy.observe(false), None);
    }

    #[test]
    fn reset_forgets_presence() {
        let mut policy = EmergencyPolicy::new();
        policy.observe(true);
        policy.reset();
        assert_eq!(policy.observe(true), Some(Signal::Emergency));
    }

    #[test]
    fn edge_is_not_recorded_until_committed() {
        let mut policy = EmergencyPolicy::new();
        assert_eq!(policy.edge(true), Some(Signal::Emergency));
        assert_eq!(policy.edge(true), Some(Signal::Emergency));
        assert!(!policy.is_present());

        policy.commit(true);
        assert_eq!(policy.edge(true), None);
    }

    #[test]
    fn settle_reopens_an_edge_that_did_not_take() {
        let mut policy = EmergencyPolicy::new();
        policy.observe(true);

        policy.settle(false);

        assert!(!policy.is_present());
        assert_eq!(policy.observe(true), Some(Signal::Emergency));
    }

    #[test]
    fn settle_keeps_a_preemption_in_force() {
        let mut policy = EmergencyPolicy::new();
        policy.observe(true);
        policy.settle(true);
        assert_eq!(policy.observe(true), None);
        assert_eq!(policy.observe(false), Some(Signal::ClearEmergency));
    }
}
