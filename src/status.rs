//! Periodic status reports.
//!
//! A heartbeat goes out every `status_interval_ms` whatever the controller
//! is doing. Reports serialize as a `status_update` event array, the same
//! shape remote commands arrive in.

use crate::runtime::wait_for_shutdown;
use crate::traffic::Phase;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

pub const STATUS_EVENT: &str = "status_update";

/// Source of the uplink signal strength, if there is an uplink.
pub trait LinkMonitor: Send + 'static {
    fn signal_dbm(&self) -> Option<i32>;
}

/// No uplink to measure.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLink;

impl LinkMonitor for NoLink {
    fn signal_dbm(&self) -> Option<i32> {
        None
    }
}

impl<F> LinkMonitor for F
where
    F: Fn() -> Option<i32> + Send + 'static,
{
    fn signal_dbm(&self) -> Option<i32> {
        self()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub uptime_ms: u64,
    #[serde(rename = "WiFi Dbm", skip_serializing_if = "Option::is_none", default)]
    pub link_dbm: Option<i32>,
    pub phase: Phase,
}

impl StatusReport {
    /// `["status_update",{...}]`
    ///
    /// ```rust
    /// use junction::status::StatusReport;
    /// use junction::traffic::Phase;
    ///
    /// let report = StatusReport { uptime_ms: 2000, link_dbm: Some(-61), phase: Phase::Idle };
    /// assert_eq!(
    ///     report.to_event_json().unwrap(),
    ///     r#"["status_update",{"uptimeMs":2000,"WiFi Dbm":-61,"phase":"Idle"}]"#
    /// );
    /// ```
    pub fn to_event_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&(STATUS_EVENT, self))
    }
}

/// Emit a report every `period` until shutdown or until nobody listens.
pub async fn run_heartbeat<L: LinkMonitor>(
    link: L,
    period: Duration,
    phase: watch::Receiver<Phase>,
    reports: mpsc::Sender<StatusReport>,
    shutdown: watch::Receiver<bool>,
) {
    let started = Instant::now();
    let mut ticker = time::interval_at(started + period, period);
    let stop = wait_for_shutdown(shutdown);
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = StatusReport {
                    uptime_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    link_dbm: link.signal_dbm(),
                    phase: *phase.borrow(),
                };
                debug!(?report, "status");
                match reports.try_send(report) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => warn!("status consumer lagging, report dropped"),
                    Err(TrySendError::Closed(_)) => {
                        info!("status receiver gone, heartbeat stopped");
                        return;
                    }
                }
            }
            _ = &mut stop => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_without_link_omits_signal() {
        let report = StatusReport {
            uptime_ms: 10,
            link_dbm: None,
            phase: Phase::PhaseBHold,
        };
        assert_eq!(
            report.to_event_json().unwrap(),
            r#"["status_update",{"uptimeMs":10,"phase":"PhaseBHold"}]"#
        );
    }

    #[test]
    fn closures_are_link_monitors() {
        let link = || Some(-70);
        assert_eq!(link.signal_dbm(), Some(-70));
        assert_eq!(NoLink.signal_dbm(), None);
    }

    #[tokio::test]
    async fn heartbeat_reports_current_phase() {
        let (_phase_tx, phase_rx) = watch::channel(Phase::Emergency);
        let (reports_tx, mut reports_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run_heartbeat(
            || Some(-55),
            Duration::from_millis(5),
            phase_rx,
            reports_tx,
            shutdown_rx,
        ));

        let report = reports_rx.recv().await.unwrap();
        assert_eq!(report.phase, Phase::Emergency);
        assert_eq!(report.link_dbm, Some(-55));
        assert!(report.uptime_ms >= 5);

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
