//! Two-Street Intersection Controller
//!
//! This example drives the adaptive controller by hand, without the async
//! runtime: timers are fired explicitly instead of by sleeping tasks.
//!
//! Key concepts:
//! - Start, then a full timed cycle of holds and yellows
//! - Hold durations stretched by the vehicle count
//! - Emergency preemption and fixed resumption to phase A
//!
//! Run with: cargo run --example intersection

use junction::actuation::{Command, RecordingSink};
use junction::config::ControllerConfig;
use junction::engine::RingQueue;
use junction::traffic::{ControlMessage, Controller, Signal, TimerTicket};
use std::sync::Arc;

fn print_commands(sink: &RecordingSink) -> Option<TimerTicket> {
    let mut ticket = None;
    for command in sink.take() {
        println!("    {:?}", command);
        if let Command::ArmTimeout {
            phase, generation, ..
        } = command
        {
            ticket = Some(TimerTicket { phase, generation });
        }
    }
    ticket
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("junction=info")
        .init();

    println!("=== Intersection Controller ===\n");

    let sink = Arc::new(RecordingSink::new());
    let mut controller = Controller::new(
        ControllerConfig::default(),
        sink.clone(),
        RingQueue::<Signal>::new(),
    )
    .unwrap();
    println!("Initial phase: {:?}\n", controller.phase());

    println!("Start with 12 vehicles waiting:");
    controller.handle(ControlMessage::VehicleCount(12));
    controller.handle(ControlMessage::Signal(Signal::Start));
    controller.cycle();
    println!("  -> {:?}", controller.phase());
    let mut ticket = print_commands(&sink);

    println!("\nOne full cycle on timers:");
    for _ in 0..4 {
        let Some(fired) = ticket else { break };
        controller.on_timer(fired);
        println!("  -> {:?}", controller.phase());
        ticket = print_commands(&sink);
    }

    println!("\nAmbulance detected:");
    controller.handle(ControlMessage::Ambulance(true));
    controller.cycle();
    println!("  -> {:?}", controller.phase());
    print_commands(&sink);

    if let Some(late) = ticket {
        println!("\nTimer armed before the preemption fires late:");
        println!("  applied: {}", controller.on_timer(late));
    }

    println!("\nAmbulance gone:");
    controller.handle(ControlMessage::Ambulance(false));
    controller.cycle();
    println!("  -> {:?}", controller.phase());
    print_commands(&sink);

    println!("\nAudit trail: {:?}", controller.engine().history().get_path());

    println!("\n=== Example Complete ===");
}
