//! Property-based tests for the engine and the traffic policies.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use junction::actuation::{CommandSink, RecordingSink, Street};
use junction::config::ControllerConfig;
use junction::core::{Cause, StateHistory, StateTransition};
use junction::engine::{Dispatch, Engine, EventQueue, RingQueue, SharedQueue};
use junction::policy::{EmergencyPolicy, TimingPolicy};
use junction::traffic::{Controller, Phase, Signal};
use proptest::prelude::*;
use std::sync::Arc;

prop_compose! {
    fn arbitrary_phase()(index in 0..Phase::ALL.len()) -> Phase {
        Phase::ALL[index]
    }
}

prop_compose! {
    fn arbitrary_signal()(index in 0..Signal::ALL.len()) -> Signal {
        Signal::ALL[index]
    }
}

fn controller() -> Controller<RingQueue<Signal>> {
    let sink: Arc<dyn CommandSink> = Arc::new(RecordingSink::new());
    Controller::new(ControllerConfig::default(), sink, RingQueue::new()).unwrap()
}

proptest! {
    #[test]
    fn unregistered_pair_leaves_state(state in arbitrary_phase(), signal in arbitrary_signal()) {
        let mut engine: Engine<Phase, Signal> = Engine::new(state);

        let outcome = engine.dispatch(signal);

        prop_assert_eq!(outcome, Dispatch::Unmatched { state });
        prop_assert_eq!(engine.current_state(), state);
    }

    #[test]
    fn first_registration_wins(
        from in arbitrary_phase(),
        signal in arbitrary_signal(),
        targets in prop::collection::vec(arbitrary_phase(), 1..8),
    ) {
        let mut engine: Engine<Phase, Signal> = Engine::new(from);
        for to in &targets {
            engine.register_transition(from, *to, signal, None).unwrap();
        }

        engine.dispatch(signal);

        prop_assert_eq!(engine.current_state(), targets[0]);
    }

    #[test]
    fn ring_queue_keeps_first_n_in_order(events in prop::collection::vec(arbitrary_signal(), 0..40)) {
        let mut queue: RingQueue<Signal, 16> = RingQueue::new();
        let accepted = events.iter().filter(|e| queue.push(**e).is_ok()).count();

        prop_assert_eq!(accepted, events.len().min(16));
        let drained: Vec<Signal> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(&drained[..], &events[..accepted]);
    }

    #[test]
    fn shared_queue_keeps_first_n_in_order(
        capacity in 1usize..24,
        events in prop::collection::vec(arbitrary_signal(), 0..40),
    ) {
        let mut queue = SharedQueue::new(capacity).unwrap();
        let sender = queue.sender();
        let accepted = events.iter().filter(|e| sender.try_push(**e).is_ok()).count();

        prop_assert_eq!(accepted, events.len().min(capacity));
        prop_assert_eq!(queue.len(), accepted);
        let drained: Vec<Signal> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(&drained[..], &events[..accepted]);
    }

    #[test]
    fn hold_never_below_base(
        base in 1u64..120_000,
        extra in 0u64..10_000,
        threshold in 0u32..50,
        count in any::<u32>(),
    ) {
        let policy = TimingPolicy {
            base_minimum_ms: base,
            extra_per_vehicle_ms: extra,
            count_threshold: threshold,
            ..TimingPolicy::default()
        };

        let hold = policy.hold_duration_ms(count);

        prop_assert!(hold >= base);
        if count <= threshold {
            prop_assert_eq!(hold, base);
        }
    }

    #[test]
    fn hold_is_monotonic_in_count(count in 0u32..10_000) {
        let policy = TimingPolicy::default();
        prop_assert!(policy.hold_duration_ms(count + 1) >= policy.hold_duration_ms(count));
    }

    #[test]
    fn emergency_pushes_only_on_edges(reports in prop::collection::vec(any::<bool>(), 0..50)) {
        let mut policy = EmergencyPolicy::new();
        let mut last = false;
        let mut expected = 0;
        let mut pushed = 0;

        for present in reports {
            if present != last {
                expected += 1;
                last = present;
            }
            if policy.observe(present).is_some() {
                pushed += 1;
            }
        }

        prop_assert_eq!(pushed, expected);
        prop_assert_eq!(policy.is_present(), last);
    }

    #[test]
    fn reachable_patterns_never_show_two_greens(
        signals in prop::collection::vec(arbitrary_signal(), 0..60),
    ) {
        let mut controller = controller();
        for signal in signals {
            controller.push(signal);
            controller.cycle();
            for street in [Street::A, Street::B] {
                if let Some(pattern) = controller.phase().lights(street) {
                    prop_assert!(pattern.is_conflict_free());
                }
            }
        }
    }

    #[test]
    fn controller_ignores_unknown_signals_safely(
        signals in prop::collection::vec(arbitrary_signal(), 0..60),
    ) {
        let mut controller = controller();
        for signal in signals {
            let before = controller.phase();
            controller.push(signal);
            controller.cycle();
            let after = controller.phase();
            if before == after {
                continue;
            }
            prop_assert!(
                controller.engine().table().find(before, signal).is_some(),
                "{:?} -> {:?} on {:?} without a row", before, after, signal
            );
        }
    }

    #[test]
    fn history_keeps_newest_records(
        capacity in 1usize..16,
        states in prop::collection::vec(arbitrary_phase(), 1..40),
    ) {
        let mut history: StateHistory<Phase, Signal> = StateHistory::with_capacity(capacity);
        let mut from = Phase::Idle;
        for to in &states {
            history.record(StateTransition::now(from, *to, Cause::Forced));
            from = *to;
        }

        prop_assert_eq!(history.len(), states.len().min(capacity));
        let path = history.get_path();
        prop_assert_eq!(path.last().copied(), states.last());
    }
}
