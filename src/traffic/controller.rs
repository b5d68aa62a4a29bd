//! The traffic-phase controller: transition table wiring, inbox handling
//! and timer bookkeeping on top of the generic engine.

use crate::actuation::{Command, CommandSink, PumpCommand};
use crate::builder::{BuildError, EngineBuilder, TransitionBuilder};
use crate::config::ControllerConfig;
use crate::core::{action, Sequence, SharedAction};
use crate::engine::{DrainSummary, Engine, EventQueue, Transition};
use crate::policy::{EmergencyPolicy, TimingPolicy};
use crate::traffic::{Phase, Signal};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Typed update delivered to the controller's inbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMessage {
    /// Latest ambulance presence report.
    Ambulance(bool),
    /// Latest vehicle count on the monitored approach.
    VehicleCount(u32),
    /// Latest measured vehicle speed.
    Speed(u32),
    /// Raw signal from the remote operator.
    Signal(Signal),
    /// Free text from the remote operator.
    Note(String),
}

/// A fired timer, carrying what it was armed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerTicket {
    pub phase: Phase,
    pub generation: u64,
}

/// Values shared between the controller and its transition actions.
#[derive(Debug, Default)]
pub struct TrafficContext {
    vehicle_count: AtomicU32,
    generation: AtomicU64,
}

impl TrafficContext {
    pub fn vehicle_count(&self) -> u32 {
        self.vehicle_count.load(Ordering::Acquire)
    }

    pub fn set_vehicle_count(&self, count: u32) {
        self.vehicle_count.store(count, Ordering::Release);
    }

    /// Generation of the most recent timer arm.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate every pending timer and return the new generation.
    pub fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Number of rows [`cycle_transitions`] registers.
pub const CONTROLLER_TRANSITIONS: usize = 17;

/// Entry action for a HOLD phase: show its lights and arm a timeout sized
/// from the vehicle count visible when the action runs.
fn enter_hold(
    phase: Phase,
    config: &ControllerConfig,
    context: &Arc<TrafficContext>,
    sink: &Arc<dyn CommandSink>,
) -> SharedAction {
    let lights = phase.lights(config.priority_street);
    let timing: TimingPolicy = config.timing;
    let context = Arc::clone(context);
    let sink = Arc::clone(sink);
    action(move || {
        if let Some(pattern) = lights {
            sink.send(Command::SetLights(pattern));
        }
        let count = context.vehicle_count();
        let after_ms = timing.hold_duration_ms(count);
        debug!(phase = ?phase, count, after_ms, "hold duration");
        sink.send(Command::ArmTimeout {
            phase,
            after_ms,
            generation: context.advance_generation(),
        });
    })
}

/// Entry action for a yellow phase: fixed duration.
fn enter_yellow(
    phase: Phase,
    config: &ControllerConfig,
    context: &Arc<TrafficContext>,
    sink: &Arc<dyn CommandSink>,
) -> SharedAction {
    let lights = phase.lights(config.priority_street);
    let after_ms = config.timing.yellow_duration_ms();
    let context = Arc::clone(context);
    let sink = Arc::clone(sink);
    action(move || {
        if let Some(pattern) = lights {
            sink.send(Command::SetLights(pattern));
        }
        sink.send(Command::ArmTimeout {
            phase,
            after_ms,
            generation: context.advance_generation(),
        });
    })
}

fn enter_emergency(
    config: &ControllerConfig,
    context: &Arc<TrafficContext>,
    sink: &Arc<dyn CommandSink>,
) -> SharedAction {
    let lights = Phase::Emergency.lights(config.priority_street);
    let context = Arc::clone(context);
    let sink = Arc::clone(sink);
    action(move || {
        context.advance_generation();
        sink.send(Command::AllSafe);
        if let Some(pattern) = lights {
            sink.send(Command::SetLights(pattern));
        }
    })
}

fn stop_all(context: &Arc<TrafficContext>, sink: &Arc<dyn CommandSink>) -> SharedAction {
    let context = Arc::clone(context);
    let sink = Arc::clone(sink);
    action(move || {
        context.advance_generation();
        sink.send(Command::AllOff);
        sink.send(Command::Pump(PumpCommand::Close));
    })
}

/// The controller's full transition table, in registration order.
pub fn cycle_transitions(
    config: &ControllerConfig,
    context: &Arc<TrafficContext>,
    sink: &Arc<dyn CommandSink>,
) -> Result<Vec<Transition<Phase, Signal>>, BuildError> {
    let hold_a = enter_hold(Phase::PhaseAHold, config, context, sink);
    let hold_b = enter_hold(Phase::PhaseBHold, config, context, sink);
    let yellow_ab = enter_yellow(Phase::PhaseAToB, config, context, sink);
    let yellow_ba = enter_yellow(Phase::PhaseBToA, config, context, sink);
    let preempt = enter_emergency(config, context, sink);
    let stop = stop_all(context, sink);
    let resume = {
        let sink = Arc::clone(sink);
        Sequence::shared(vec![
            action(move || sink.send(Command::ResumeNormal)),
            Arc::clone(&hold_a),
        ])
    };

    let row = |from: Phase, on: Signal, to: Phase, run: &SharedAction| {
        TransitionBuilder::new()
            .from(from)
            .on(on)
            .to(to)
            .action(Arc::clone(run))
            .build()
    };

    let mut rows = vec![
        row(Phase::Idle, Signal::Start, Phase::PhaseAHold, &hold_a)?,
        row(Phase::PhaseAHold, Signal::Timeout, Phase::PhaseAToB, &yellow_ab)?,
        row(Phase::PhaseAToB, Signal::Timeout, Phase::PhaseBHold, &hold_b)?,
        row(Phase::PhaseBHold, Signal::Timeout, Phase::PhaseBToA, &yellow_ba)?,
        row(Phase::PhaseBToA, Signal::Timeout, Phase::PhaseAHold, &hold_a)?,
        row(Phase::PhaseAHold, Signal::Switch, Phase::PhaseAToB, &yellow_ab)?,
        row(Phase::PhaseBHold, Signal::Switch, Phase::PhaseBToA, &yellow_ba)?,
    ];
    for phase in Phase::CYCLE {
        rows.push(row(phase, Signal::Emergency, Phase::Emergency, &preempt)?);
    }
    rows.push(row(
        Phase::Emergency,
        Signal::ClearEmergency,
        Phase::PhaseAHold,
        &resume,
    )?);
    for phase in Phase::CYCLE.into_iter().chain([Phase::Emergency]) {
        rows.push(row(phase, Signal::Stop, Phase::Idle, &stop)?);
    }

    Ok(rows)
}

/// Owns the engine and everything the policies need between cycles.
pub struct Controller<Q: EventQueue<Signal>> {
    engine: Engine<Phase, Signal, Q>,
    config: ControllerConfig,
    context: Arc<TrafficContext>,
    sink: Arc<dyn CommandSink>,
    emergency: EmergencyPolicy,
    extra_hint_ms: Option<u64>,
}

impl<Q: EventQueue<Signal>> Controller<Q> {
    /// Build the controller in `Idle` with the full table registered.
    pub fn new(
        config: ControllerConfig,
        sink: Arc<dyn CommandSink>,
        queue: Q,
    ) -> Result<Self, BuildError> {
        let context = Arc::new(TrafficContext::default());
        let engine = EngineBuilder::new()
            .initial(Phase::Idle)
            .queue(queue)
            .table_capacity(config.table_capacity)
            .history_capacity(config.history_capacity)
            .transitions(cycle_transitions(&config, &context, &sink)?)
            .build()?;

        info!(
            transitions = engine.table().len(),
            priority = ?config.priority_street,
            "controller ready"
        );

        Ok(Self {
            engine,
            config,
            context,
            sink,
            emergency: EmergencyPolicy::new(),
            extra_hint_ms: None,
        })
    }

    /// Apply one inbox message. Events are queued, never dispatched here.
    pub fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Ambulance(present) => {
                if let Some(signal) = self.emergency.edge(present) {
                    info!(present, "ambulance presence changed");
                    if self.push(signal) {
                        self.emergency.commit(present);
                    }
                }
            }
            ControlMessage::VehicleCount(count) => {
                self.context.set_vehicle_count(count);
                self.extra_hint_ms = self.config.timing.extra_duration_hint_ms(count);
                debug!(count, extra_ms = ?self.extra_hint_ms, "vehicle count updated");
            }
            ControlMessage::Speed(speed) => {
                let command = PumpCommand::for_speed(speed, self.config.speed_threshold);
                debug!(speed, ?command, "speed report");
                self.sink.send(Command::Pump(command));
            }
            ControlMessage::Signal(signal) => {
                self.push(signal);
            }
            ControlMessage::Note(text) => info!(%text, "remote message"),
        }
    }

    /// Apply a fired timer as `Timeout` if it is still the live one.
    ///
    /// Events queued ahead of the timer are dispatched first, so the ticket
    /// is checked against the phase the timeout would actually leave.
    /// Returns `true` when the timeout moved the controller.
    pub fn on_timer(&mut self, ticket: TimerTicket) -> bool {
        if self.engine.pending_events() > 0 {
            let summary = self.engine.drain_and_dispatch();
            debug!(?summary, "drained ahead of timer");
            self.settle_emergency();
        }

        let current = self.engine.current_state();
        let live = self.context.generation();
        if ticket.phase != current || ticket.generation != live {
            debug!(
                armed_for = ?ticket.phase,
                current = ?current,
                generation = ticket.generation,
                live,
                "stale timer ignored"
            );
            return false;
        }
        self.engine.dispatch(Signal::Timeout).is_matched()
    }

    /// One control cycle: drain and dispatch everything queued so far.
    pub fn cycle(&mut self) -> DrainSummary {
        let summary = self.engine.drain_and_dispatch();
        self.settle_emergency();
        summary
    }

    /// Once nothing is queued, presence is whatever the engine ended up in.
    /// An edge that was dropped or unmatched is then pushed again on the
    /// next report.
    fn settle_emergency(&mut self) {
        if self.engine.pending_events() == 0 {
            self.emergency
                .settle(self.engine.current_state() == Phase::Emergency);
        }
    }

    /// Queue an event. A full queue is reported by the queue itself.
    pub fn push(&mut self, signal: Signal) -> bool {
        self.engine.push_event(signal).is_ok()
    }

    /// Return to `Idle` with a fresh table and an empty queue. No actions run.
    pub fn reset(&mut self) -> Result<(), BuildError> {
        self.engine.reset(Phase::Idle);
        self.emergency.reset();
        self.context.advance_generation();
        for row in cycle_transitions(&self.config, &self.context, &self.sink)? {
            self.engine.register(row)?;
        }
        Ok(())
    }

    /// Escape hatch: overwrite the phase without running any action.
    ///
    /// Pending timers are invalidated; outputs are left as they are.
    pub fn force_phase(&mut self, phase: Phase) {
        self.context.advance_generation();
        self.engine.set_state(phase);
    }

    pub fn phase(&self) -> Phase {
        self.engine.current_state()
    }

    pub fn vehicle_count(&self) -> u32 {
        self.context.vehicle_count()
    }

    pub fn extra_duration_hint_ms(&self) -> Option<u64> {
        self.extra_hint_ms
    }

    pub fn ambulance_present(&self) -> bool {
        self.emergency.is_present()
    }

    pub fn context(&self) -> &Arc<TrafficContext> {
        &self.context
    }

    pub fn engine(&self) -> &Engine<Phase, Signal, Q> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::{Lamp, LightPattern, RecordingSink, Street};
    use crate::engine::RingQueue;

    fn controller() -> (Controller<RingQueue<Signal>>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let controller = Controller::new(
            ControllerConfig::default(),
            Arc::clone(&sink) as Arc<dyn CommandSink>,
            RingQueue::new(),
        )
        .unwrap();
        (controller, sink)
    }

    fn armed(commands: &[Command]) -> Option<(Phase, u64, u64)> {
        commands.iter().find_map(|c| match c {
            Command::ArmTimeout {
                phase,
                after_ms,
                generation,
            } => Some((*phase, *after_ms, *generation)),
            _ => None,
        })
    }

    #[test]
    fn table_has_expected_size() {
        let (controller, _) = controller();
        assert_eq!(controller.engine().table().len(), CONTROLLER_TRANSITIONS);
    }

    #[test]
    fn start_enters_phase_a_with_base_hold() {
        let (mut controller, sink) = controller();

        controller.handle(ControlMessage::Signal(Signal::Start));
        controller.cycle();

        assert_eq!(controller.phase(), Phase::PhaseAHold);
        let commands = sink.take();
        assert_eq!(
            commands[0],
            Command::SetLights(LightPattern::only(Street::A, Lamp::Green))
        );
        assert_eq!(armed(&commands).map(|a| a.1), Some(30_000));
    }

    #[test]
    fn full_cycle_follows_timeouts() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();

        let expected = [
            Phase::PhaseAToB,
            Phase::PhaseBHold,
            Phase::PhaseBToA,
            Phase::PhaseAHold,
        ];
        for next in expected {
            let (phase, _, generation) = armed(&sink.take()).unwrap();
            assert!(controller.on_timer(TimerTicket { phase, generation }));
            controller.cycle();
            assert_eq!(controller.phase(), next);
        }
    }

    #[test]
    fn yellow_duration_is_fixed() {
        let (mut controller, sink) = controller();
        controller.handle(ControlMessage::VehicleCount(40));
        controller.push(Signal::Start);
        controller.push(Signal::Switch);
        controller.cycle();

        let commands = sink.take();
        let arms: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                Command::ArmTimeout { after_ms, .. } => Some(*after_ms),
                _ => None,
            })
            .collect();
        assert_eq!(arms, vec![30_000 + 31 * 3_000, 5_000]);
        assert_eq!(controller.phase(), Phase::PhaseAToB);
    }

    #[test]
    fn count_update_mid_phase_applies_on_next_entry() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        let (_, first_ms, _) = armed(&sink.take()).unwrap();

        controller.handle(ControlMessage::VehicleCount(12));
        assert_eq!(controller.extra_duration_hint_ms(), Some(9_000));

        controller.push(Signal::Switch);
        controller.cycle();
        let (phase, _, generation) = armed(&sink.take()).unwrap();
        controller.on_timer(TimerTicket { phase, generation });
        controller.cycle();
        let (phase, hold_ms, _) = armed(&sink.take()).unwrap();

        assert_eq!(first_ms, 30_000);
        assert_eq!(phase, Phase::PhaseBHold);
        assert_eq!(hold_ms, 39_000);
    }

    #[test]
    fn stale_timer_is_ignored() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        let (phase, _, generation) = armed(&sink.take()).unwrap();

        controller.handle(ControlMessage::Ambulance(true));
        controller.cycle();
        assert_eq!(controller.phase(), Phase::Emergency);

        assert!(!controller.on_timer(TimerTicket { phase, generation }));
        assert_eq!(controller.engine().pending_events(), 0);
    }

    #[test]
    fn superseded_arm_is_ignored_even_in_same_phase() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        let (phase, _, old) = armed(&sink.take()).unwrap();

        controller.handle(ControlMessage::Ambulance(true));
        controller.handle(ControlMessage::Ambulance(false));
        controller.cycle();
        assert_eq!(controller.phase(), Phase::PhaseAHold);

        assert!(!controller.on_timer(TimerTicket {
            phase,
            generation: old
        }));
        let (_, _, fresh) = armed(&sink.take()).unwrap();
        assert!(controller.on_timer(TimerTicket {
            phase,
            generation: fresh
        }));
    }

    #[test]
    fn emergency_preempts_and_resumes_phase_a() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.push(Signal::Switch);
        controller.cycle();
        sink.take();

        controller.handle(ControlMessage::Ambulance(true));
        controller.handle(ControlMessage::Ambulance(true));
        controller.cycle();
        assert_eq!(controller.phase(), Phase::Emergency);
        assert_eq!(
            sink.take(),
            vec![
                Command::AllSafe,
                Command::SetLights(LightPattern::only(Street::A, Lamp::Green)),
            ]
        );

        controller.handle(ControlMessage::Ambulance(false));
        controller.cycle();
        assert_eq!(controller.phase(), Phase::PhaseAHold);
        let commands = sink.take();
        assert_eq!(commands[0], Command::ResumeNormal);
        assert!(armed(&commands).is_some());
    }

    #[test]
    fn speed_report_goes_straight_to_pump() {
        let (mut controller, sink) = controller();
        controller.handle(ControlMessage::Speed(95));
        controller.handle(ControlMessage::Speed(40));

        assert_eq!(
            sink.take(),
            vec![
                Command::Pump(PumpCommand::Open),
                Command::Pump(PumpCommand::Close)
            ]
        );
        assert_eq!(controller.engine().pending_events(), 0);
    }

    #[test]
    fn stop_returns_to_idle_dark() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        sink.take();

        controller.handle(ControlMessage::Signal(Signal::Stop));
        controller.cycle();

        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(
            sink.take(),
            vec![Command::AllOff, Command::Pump(PumpCommand::Close)]
        );
    }

    #[test]
    fn reset_reregisters_table() {
        let (mut controller, _) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        controller.handle(ControlMessage::Ambulance(true));

        controller.reset().unwrap();

        assert_eq!(controller.phase(), Phase::Idle);
        assert!(!controller.ambulance_present());
        assert_eq!(controller.engine().pending_events(), 0);
        assert_eq!(controller.engine().table().len(), CONTROLLER_TRANSITIONS);
        controller.push(Signal::Start);
        controller.cycle();
        assert_eq!(controller.phase(), Phase::PhaseAHold);
    }

    #[test]
    fn force_phase_runs_no_action() {
        let (mut controller, sink) = controller();
        controller.force_phase(Phase::PhaseBHold);

        assert_eq!(controller.phase(), Phase::PhaseBHold);
        assert!(sink.take().is_empty());
        assert_eq!(controller.engine().history().forced().count(), 1);
    }

    #[test]
    fn queued_events_apply_before_a_timer() {
        let (mut controller, sink) = controller();
        controller.push(Signal::Start);
        controller.cycle();
        let (phase, _, generation) = armed(&sink.take()).unwrap();

        controller.handle(ControlMessage::Ambulance(true));
        assert!(!controller.on_timer(TimerTicket { phase, generation }));

        assert_eq!(controller.phase(), Phase::Emergency);
        assert_eq!(controller.engine().pending_events(), 0);
        assert!(controller.ambulance_present());
    }

    #[test]
    fn unmatched_emergency_is_not_remembered() {
        let (mut controller, _) = controller();
        controller.handle(ControlMessage::Ambulance(true));
        assert!(controller.ambulance_present());

        controller.cycle();

        assert!(!controller.ambulance_present());
    }
}
