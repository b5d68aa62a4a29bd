//! Intersection states and the signals that move between them.

use crate::actuation::{Lamp, LightPattern, Street};
use crate::{event_enum, state_enum};

state_enum! {
    /// Controller state. Exactly one is current at any time.
    pub enum Phase {
        Idle,
        /// Street A green, street B red.
        PhaseAHold,
        /// Street A yellow, street B red.
        PhaseAToB,
        /// Street B green, street A red.
        PhaseBHold,
        /// Street B yellow, street A red.
        PhaseBToA,
        /// Preempted for an emergency vehicle.
        Emergency,
        Error,
        Complete,
    }
    final: [Complete]
    error: [Error]
}

event_enum! {
    /// Events consumed by the controller's engine.
    pub enum Signal {
        None,
        Start,
        Switch,
        Emergency,
        ClearEmergency,
        Resume,
        Stop,
        Timeout,
        Success,
        Failure,
    }
}

impl Phase {
    /// States of the normal four-phase cycle, in order.
    pub const CYCLE: [Phase; 4] = [
        Phase::PhaseAHold,
        Phase::PhaseAToB,
        Phase::PhaseBHold,
        Phase::PhaseBToA,
    ];

    pub fn is_hold(self) -> bool {
        matches!(self, Self::PhaseAHold | Self::PhaseBHold)
    }

    pub fn is_yellow(self) -> bool {
        matches!(self, Self::PhaseAToB | Self::PhaseBToA)
    }

    pub fn in_cycle(self) -> bool {
        self.is_hold() || self.is_yellow()
    }

    /// Outputs shown while this phase is held. `priority` is the street kept
    /// clear during preemption. Phases without their own outputs return
    /// `None`.
    pub fn lights(self, priority: Street) -> Option<LightPattern> {
        match self {
            Self::PhaseAHold => Some(LightPattern::only(Street::A, Lamp::Green)),
            Self::PhaseAToB => Some(LightPattern::only(Street::A, Lamp::Yellow)),
            Self::PhaseBHold => Some(LightPattern::only(Street::B, Lamp::Green)),
            Self::PhaseBToA => Some(LightPattern::only(Street::B, Lamp::Yellow)),
            Self::Emergency => Some(LightPattern::only(priority, Lamp::Green)),
            Self::Idle | Self::Error | Self::Complete => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, State};

    #[test]
    fn names_match_variants() {
        assert_eq!(Phase::PhaseAToB.name(), "PhaseAToB");
        assert_eq!(Signal::ClearEmergency.name(), "ClearEmergency");
        assert!(Phase::Error.is_error());
        assert!(Phase::Complete.is_final());
    }

    #[test]
    fn cycle_classification() {
        for phase in Phase::CYCLE {
            assert!(phase.in_cycle());
        }
        assert!(!Phase::Emergency.in_cycle());
        assert!(!Phase::Idle.in_cycle());
    }

    #[test]
    fn no_phase_shows_two_greens() {
        for priority in [Street::A, Street::B] {
            for phase in Phase::ALL {
                if let Some(pattern) = phase.lights(priority) {
                    assert!(pattern.is_conflict_free(), "{phase:?} with {priority:?}");
                }
            }
        }
    }

    #[test]
    fn emergency_clears_priority_street() {
        let pattern = Phase::Emergency.lights(Street::B).unwrap();
        assert_eq!(pattern.lamp(Street::B), Lamp::Green);
        assert_eq!(pattern.lamp(Street::A), Lamp::Red);
    }
}
