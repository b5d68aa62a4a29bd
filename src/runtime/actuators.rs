//! Command routing, timers and actuator tasks.

use crate::actuation::{Command, LightBank, OutputDriver, PumpCommand, PumpValve};
use crate::traffic::TimerTicket;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};

/// Fan commands out to the actuator queues and turn `ArmTimeout` into
/// sleeping timer tasks.
pub(crate) async fn run_router(
    mut commands: mpsc::Receiver<Command>,
    lights: mpsc::Sender<Command>,
    pump: mpsc::Sender<PumpCommand>,
    tickets: mpsc::Sender<TimerTicket>,
    send_timeout: Duration,
) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::ArmTimeout {
                phase,
                after_ms,
                generation,
            } => {
                let tickets = tickets.clone();
                tokio::spawn(async move {
                    time::sleep(Duration::from_millis(after_ms)).await;
                    if tickets.send(TimerTicket { phase, generation }).await.is_err() {
                        debug!(?phase, generation, "dispatch task gone, timer dropped");
                    }
                });
            }
            Command::Pump(position) => forward(&pump, position, send_timeout, "pump").await,
            other => forward(&lights, other, send_timeout, "lights").await,
        }
    }
    debug!("command router stopped");
}

async fn forward<T: Debug>(
    tx: &mpsc::Sender<T>,
    item: T,
    timeout: Duration,
    actuator: &'static str,
) {
    if let Err(e) = tx.send_timeout(item, timeout).await {
        warn!(actuator, "actuator queue unavailable, command dropped: {e}");
    }
}

pub(crate) async fn run_lights<D: OutputDriver>(driver: D, mut rx: mpsc::Receiver<Command>) {
    let mut bank = LightBank::new(driver);
    while let Some(command) = rx.recv().await {
        // Rejected patterns are logged by the bank and leave outputs as they were.
        let _ = bank.apply(&command);
    }
}

pub(crate) async fn run_pump<D: OutputDriver>(driver: D, mut rx: mpsc::Receiver<PumpCommand>) {
    let mut valve = PumpValve::new(driver);
    while let Some(command) = rx.recv().await {
        valve.apply(command);
    }
}
