//! The control loop task. Sole owner of the controller.

use crate::actuation::{Command, CommandBus, CommandSink};
use crate::config::Config;
use crate::core::StateHistory;
use crate::engine::SharedQueue;
use crate::traffic::{ControlMessage, Controller, Phase, Signal, TimerTicket};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

/// Run until shutdown or until every inbox sender is gone.
///
/// Returns the audit trail, or `None` if the controller could not be built.
pub(crate) async fn run_dispatch(
    config: Config,
    mut inbox: mpsc::Receiver<ControlMessage>,
    mut tickets: mpsc::Receiver<TimerTicket>,
    commands: mpsc::Sender<Command>,
    phase_tx: watch::Sender<Phase>,
    mut shutdown: watch::Receiver<bool>,
) -> Option<StateHistory<Phase, Signal>> {
    let queue = match SharedQueue::new(config.runtime.queue_capacity) {
        Ok(queue) => queue,
        Err(e) => {
            error!("dispatch task not started: {e}");
            return None;
        }
    };
    let sink: Arc<dyn CommandSink> = Arc::new(CommandBus::new(commands));
    let mut controller = match Controller::new(config.controller, sink, queue) {
        Ok(controller) => controller,
        Err(e) => {
            error!("dispatch task not started: {e}");
            return None;
        }
    };

    let mut tick = time::interval(Duration::from_millis(config.runtime.cycle_period_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(period_ms = config.runtime.cycle_period_ms, "dispatch loop running");

    loop {
        tokio::select! {
            message = inbox.recv() => match message {
                Some(message) => controller.handle(message),
                None => {
                    info!("inbox closed, dispatch loop stopping");
                    break;
                }
            },
            Some(ticket) = tickets.recv() => {
                let before = controller.phase();
                controller.on_timer(ticket);
                if controller.phase() != before {
                    phase_tx.send_replace(controller.phase());
                }
            }
            _ = tick.tick() => {
                let summary = controller.cycle();
                if summary.processed > 0 {
                    debug!(?summary, phase = ?controller.phase(), "cycle");
                    phase_tx.send_replace(controller.phase());
                }
                tokio::task::yield_now().await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("dispatch loop stopping");
                    break;
                }
            }
        }
    }

    Some(controller.engine().history().clone())
}
