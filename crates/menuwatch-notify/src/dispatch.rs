//! Fire-and-forget delivery.
//!
//! Each send is an independent task: send, await completion or timeout,
//! log the outcome, discard it.

use crate::alert::AlertSink;
use crate::tabular::{TabularPayload, TabularSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawns notification tasks and keeps their handles for shutdown.
pub struct Dispatcher {
    timeout: Duration,
    in_flight: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Dispatcher whose tasks give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            in_flight: Vec::new(),
        }
    }

    /// Push a payload to the tabular sink in the background.
    pub fn send_table(&mut self, sink: Arc<dyn TabularSink>, payload: TabularPayload) {
        let timeout = self.timeout;
        let items = payload.items.len();
        self.track(tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.push(&payload)).await {
                Ok(Ok(status)) if (200..300).contains(&status) => {
                    info!(status, items, "tabular sink updated");
                }
                Ok(Ok(status)) => warn!(status, items, "tabular sink answered non-success"),
                Ok(Err(e)) => warn!(error = %e, "tabular sink push failed"),
                Err(_) => warn!(timeout = ?timeout, "tabular sink push timed out"),
            }
        }));
    }

    /// Fan an alert message out in the background.
    ///
    /// The guard covers the recipient read plus one concurrent round of
    /// requests, each bounded by the client timeout.
    pub fn send_alert(&mut self, sink: Arc<dyn AlertSink>, message: String) {
        let timeout = self.timeout.saturating_mul(2);
        self.track(tokio::spawn(async move {
            match tokio::time::timeout(timeout, sink.alert(&message)).await {
                Ok(Ok(report)) if report.skipped => info!("alert skipped, sink not configured"),
                Ok(Ok(report)) => info!(
                    delivered = report.delivered,
                    failed = report.failed,
                    "alert sent"
                ),
                Ok(Err(e)) => warn!(error = %e, "alert fan-out failed"),
                Err(_) => warn!(timeout = ?timeout, "alert fan-out timed out"),
            }
        }));
    }

    /// Number of sends still running.
    pub fn pending(&mut self) -> usize {
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.len()
    }

    /// Wait for every outstanding send to finish or time out.
    pub async fn drain(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "notification task aborted");
            }
        }
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(handle);
    }
}
