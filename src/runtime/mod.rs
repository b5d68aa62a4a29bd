//! Task layout for a running intersection.
//!
//! ```text
//! inbox ──> dispatch ──commands──> router ──> lights task
//!              ^                      ├─────> pump task
//!              └──────tickets─────────┘ (ArmTimeout sleeps)
//!
//! heartbeat ──reports──> caller
//! ```
//!
//! The dispatch task is the only owner of the controller. Everything else
//! talks to it through bounded channels.

mod actuators;
mod dispatch;

use crate::actuation::OutputDriver;
use crate::config::Config;
use crate::core::StateHistory;
use crate::status::{run_heartbeat, LinkMonitor, StatusReport};
use crate::traffic::{ControlMessage, Phase, Signal};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{error, info, warn};

/// How long a worker may take to finish after shutdown before it is aborted.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(400);

/// Resolve once the shutdown flag is set or its sender is gone.
pub async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    if *shutdown_rx.borrow() {
        return;
    }
    while shutdown_rx.changed().await.is_ok() {
        if *shutdown_rx.borrow() {
            break;
        }
    }
}

/// Handles to the spawned tasks.
pub struct Runtime {
    inbox: mpsc::Sender<ControlMessage>,
    phase: watch::Receiver<Phase>,
    shutdown: watch::Sender<bool>,
    dispatch: JoinHandle<Option<StateHistory<Phase, Signal>>>,
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Spawn every task on the current tokio runtime.
    ///
    /// Each actuator task gets its own clone of `driver`. Status reports
    /// go to `reports`.
    pub fn spawn<D, L>(
        config: Config,
        driver: D,
        link: L,
        reports: mpsc::Sender<StatusReport>,
    ) -> Self
    where
        D: OutputDriver + Clone,
        L: LinkMonitor,
    {
        let runtime = config.runtime;
        let (inbox_tx, inbox_rx) = mpsc::channel(runtime.inbox_capacity.max(1));
        let (command_tx, command_rx) = mpsc::channel(runtime.command_capacity.max(1));
        let (lights_tx, lights_rx) = mpsc::channel(runtime.command_capacity.max(1));
        let (pump_tx, pump_rx) = mpsc::channel(runtime.command_capacity.max(1));
        let (ticket_tx, ticket_rx) = mpsc::channel(runtime.command_capacity.max(1));
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let dispatch = tokio::spawn(dispatch::run_dispatch(
            config,
            inbox_rx,
            ticket_rx,
            command_tx,
            phase_tx,
            shutdown_rx.clone(),
        ));

        let workers = vec![
            tokio::spawn(actuators::run_router(
                command_rx,
                lights_tx,
                pump_tx,
                ticket_tx,
                Duration::from_millis(runtime.actuator_send_timeout_ms),
            )),
            tokio::spawn(actuators::run_lights(driver.clone(), lights_rx)),
            tokio::spawn(actuators::run_pump(driver, pump_rx)),
            tokio::spawn(run_heartbeat(
                link,
                Duration::from_millis(runtime.status_interval_ms.max(1)),
                phase_rx.clone(),
                reports,
                shutdown_rx,
            )),
        ];

        info!(
            cycle_period_ms = runtime.cycle_period_ms,
            status_interval_ms = runtime.status_interval_ms,
            "runtime started"
        );

        Self {
            inbox: inbox_tx,
            phase: phase_rx,
            shutdown: shutdown_tx,
            dispatch,
            workers,
        }
    }

    /// A producer handle for the controller's inbox.
    pub fn inbox(&self) -> mpsc::Sender<ControlMessage> {
        self.inbox.clone()
    }

    /// Phase after the most recent cycle that dispatched anything.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Stop every task and return the controller's audit trail.
    pub async fn shutdown(self) -> Option<StateHistory<Phase, Signal>> {
        let _ = self.shutdown.send(true);
        drop(self.inbox);

        let history = match self.dispatch.await {
            Ok(history) => history,
            Err(e) => {
                error!("dispatch task failed: {e}");
                None
            }
        };

        for mut handle in self.workers {
            if time::timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                warn!("worker did not stop in time, aborting");
                handle.abort();
            }
        }

        info!("runtime stopped");
        history
    }
}
