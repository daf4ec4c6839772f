//! The periodic scrape loop.
//!
//! Owns the single controlled browser and serializes every access to it
//! through [`ScrapeLoop::tick`]. A tick checks the session, scrapes when
//! authenticated and hands the result to the reconciler. Failures stay
//! inside the tick and feed the escalator.

use crate::error::{LoopError, Result};
use crate::state::{should_clear_cache, should_materialize, LoopState, TickPhase};
use crate::status::{StatusHandle, StatusReport};
use menuwatch_browser::{BrowserLauncher, ControlledBrowser};
use menuwatch_core::{
    AppConfig, Clock, DisabledRecord, LoginState, MaterializerConfig, ScrapeSnapshot,
    ScrapingConfig, Sleeper, SystemClock, TokioSleeper,
};
use menuwatch_notify::{AlertSink, Dispatcher, TabularPayload, TabularSink};
use menuwatch_scraper::{
    reconcile, Decision, Extractor, Materializer, ReconciliationState, SessionMonitor,
};
use menuwatch_store::SessionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// File the login screen is captured to when the session expires.
pub const LOGIN_SCREENSHOT_FILE: &str = "login.png";

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Extraction succeeded
    Scraped { records: usize, decision: Decision },
    /// The session is not authenticated; nothing was scraped
    Expired,
    /// The pass failed and was counted
    Failed,
    /// No browser could be brought up
    Unavailable,
}

/// Periodic check/scrape/reconcile driver with failure escalation.
pub struct ScrapeLoop {
    pub(crate) scraping: ScrapingConfig,
    pub(crate) target_url: String,
    pub(crate) browser: Option<Box<dyn ControlledBrowser>>,
    pub(crate) launcher: Arc<dyn BrowserLauncher>,
    pub(crate) sessions: SessionStore,
    monitor: SessionMonitor,
    materializer_config: MaterializerConfig,
    materializer: Materializer,
    extractor: Extractor,
    tabular: Option<Arc<dyn TabularSink>>,
    alerts: Arc<dyn AlertSink>,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    screenshot_path: PathBuf,
    status: StatusHandle,
    pub(crate) state: LoopState,
}

impl ScrapeLoop {
    /// Create a loop for `config`, persisting into `data_dir`.
    ///
    /// No browser is launched until [`ScrapeLoop::start`] or the first tick.
    pub fn new(
        config: &AppConfig,
        data_dir: &Path,
        launcher: Arc<dyn BrowserLauncher>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let min_resend =
            chrono::Duration::from_std(Duration::from_secs(config.sinks.min_resend_secs))
                .unwrap_or_else(|_| chrono::Duration::weeks(52));
        Self {
            scraping: config.scraping.clone(),
            target_url: config.general.target_url.clone(),
            browser: None,
            launcher,
            sessions: SessionStore::in_dir(data_dir),
            monitor: SessionMonitor::new(config.login.clone()),
            materializer_config: config.materializer.clone(),
            materializer: Materializer::new(config.materializer.clone(), Arc::new(TokioSleeper)),
            extractor: Extractor::new(config.extractor.clone()),
            tabular: None,
            alerts,
            dispatcher: Dispatcher::new(config.sinks.request_timeout()),
            clock: Arc::new(SystemClock),
            screenshot_path: data_dir.join(LOGIN_SCREENSHOT_FILE),
            status: StatusHandle::new(),
            state: LoopState::new(ReconciliationState::new(min_resend)),
        }
    }

    /// Forward snapshots to a tabular sink.
    #[must_use]
    pub fn with_tabular_sink(mut self, sink: Arc<dyn TabularSink>) -> Self {
        self.tabular = Some(sink);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sleep source for the materializer's settle waits.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.materializer = Materializer::new(self.materializer_config.clone(), sleeper);
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Handle for external status readers.
    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn has_browser(&self) -> bool {
        self.browser.is_some()
    }

    /// Launch the browser, apply stored credentials and open the target page.
    ///
    /// # Errors
    /// Startup failures are returned to the caller and are fatal there.
    pub async fn start(&mut self) -> Result<()> {
        self.bring_up().await?;
        info!(url = %self.target_url, "scrape loop ready");
        Ok(())
    }

    /// Tick on the configured interval until `cancel` fires.
    ///
    /// The first tick runs after the startup delay. Ticks never overlap and a
    /// running tick is not interrupted by cancellation.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let delay = Duration::from_secs(self.scraping.startup_delay_secs);
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }

        let period = Duration::from_secs(self.scraping.interval_secs.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            let outcome = self.tick().await;
            debug!(?outcome, tick = self.state.tick_index, "tick finished");
            if self.state.take_rearm() {
                // Restart took the browser away; the next tick is one full period out.
                interval.reset();
                debug!("interval rearmed after restart");
            }
        }
        info!("scrape loop stopped");
    }

    /// Run one tick. Never fails; the outcome is informational.
    pub async fn tick(&mut self) -> TickOutcome {
        let index = self.state.tick_index;
        self.state.tick_index += 1;

        let outcome = self.run_tick(index).await;
        self.enter(TickPhase::Idle);
        self.publish().await;
        outcome
    }

    async fn run_tick(&mut self, index: u64) -> TickOutcome {
        if self.browser.is_none() {
            self.enter(TickPhase::Restarting);
            if let Err(e) = self.restart().await {
                // Visible on the status surface, but never escalated again.
                self.state.login = LoginState::Unknown;
                self.state.scrape_errors += 1;
                warn!(error = %e, "browser unavailable, skipping tick");
                return TickOutcome::Unavailable;
            }
        }

        if should_clear_cache(index, self.scraping.cache_clear_every) {
            if let Some(browser) = self.browser.as_deref() {
                match browser.clear_cache().await {
                    Ok(()) => debug!(tick = index, "cleared browser cache"),
                    Err(e) => warn!(error = %e, "cache clear failed"),
                }
            }
        }

        self.enter(TickPhase::Checking);
        let login = match self.browser.as_deref() {
            Some(browser) => self.monitor.check_login(browser).await,
            None => LoginState::Expired,
        };
        let previous = std::mem::replace(&mut self.state.login, login);

        if !login.is_authenticated() {
            self.on_expired(previous).await;
            return TickOutcome::Expired;
        }
        self.state.latch.disarm();
        if previous == LoginState::Expired {
            info!("session authenticated again");
            self.persist_credentials().await;
        }

        self.enter(TickPhase::Scraping);
        match self.scrape(index).await {
            Ok(records) => {
                self.state.consecutive_errors = 0;
                let count = records.len();
                let decision = self.commit(records);
                self.persist_credentials().await;
                TickOutcome::Scraped {
                    records: count,
                    decision,
                }
            }
            Err(e) => {
                self.state.consecutive_errors += 1;
                self.state.scrape_errors += 1;
                warn!(
                    error = %e,
                    consecutive = self.state.consecutive_errors,
                    "scrape pass failed"
                );
                if self.state.consecutive_errors >= self.scraping.error_threshold {
                    self.escalate().await;
                }
                TickOutcome::Failed
            }
        }
    }

    async fn on_expired(&mut self, previous: LoginState) {
        if previous == LoginState::Authenticated {
            warn!("session expired");
        }
        if !self.state.latch.arm() {
            debug!("session still expired, alert already sent");
            return;
        }

        let now = self.clock.now();
        let message = format!(
            "⚠️ menuwatch: session expired at {}. Log in again to resume monitoring.",
            now.to_rfc3339()
        );
        self.dispatcher.send_alert(self.alerts.clone(), message);
        self.capture_login_screen().await;
    }

    async fn capture_login_screen(&self) {
        let Some(browser) = self.browser.as_deref() else {
            return;
        };
        let png = match browser.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "could not capture login screen");
                return;
            }
        };
        if let Some(parent) = self.screenshot_path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!(error = %e, "could not create screenshot directory");
                return;
            }
        }
        match tokio::fs::write(&self.screenshot_path, png).await {
            Ok(()) => info!(path = %self.screenshot_path.display(), "saved login screen"),
            Err(e) => warn!(error = %e, "could not write login screen"),
        }
    }

    /// Materialize (on schedule) and extract. Touches no loop state.
    async fn scrape(&self, index: u64) -> Result<Vec<DisabledRecord>> {
        let browser = self.browser.as_deref().ok_or(LoopError::NoBrowser)?;

        if should_materialize(index, self.scraping.materialize_every) {
            let after = Duration::from_secs(self.scraping.materialize_timeout_secs);
            let report = tokio::time::timeout(after, self.materializer.materialize_list(browser))
                .await
                .map_err(|_| LoopError::Timeout {
                    stage: "materialization",
                    after,
                })?;
            debug!(steps = report.steps, converged = report.converged, "list materialized");
        }

        let after = Duration::from_secs(self.scraping.extract_timeout_secs);
        let records = tokio::time::timeout(after, self.extractor.extract(browser))
            .await
            .map_err(|_| LoopError::Timeout {
                stage: "extraction",
                after,
            })??;
        Ok(records)
    }

    /// Replace the last snapshot and reconcile it against the sink.
    fn commit(&mut self, records: Vec<DisabledRecord>) -> Decision {
        self.state.total_scrapes += 1;
        let now = self.clock.now();
        let snapshot = ScrapeSnapshot::new(records, now, self.state.total_scrapes);

        let tabular = self.tabular.clone();
        let dispatcher = &mut self.dispatcher;
        let (next, decision) = reconcile(
            &snapshot,
            self.state.reconciliation.clone(),
            now,
            |snapshot| match tabular {
                Some(sink) => dispatcher.send_table(sink, TabularPayload::from_snapshot(snapshot)),
                None => debug!("no tabular sink configured"),
            },
        );
        self.state.reconciliation = next;
        if decision.sends() {
            self.state.last_send_time = Some(now);
        }

        info!(
            scrape = snapshot.scrape_number,
            records = snapshot.records.len(),
            ?decision,
            "scrape complete"
        );
        self.state.last_snapshot = Some(snapshot);
        decision
    }

    pub(crate) async fn persist_credentials(&self) {
        let Some(browser) = self.browser.as_deref() else {
            return;
        };
        let credentials = match browser.cookies().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "could not read session credentials");
                return;
            }
        };
        match self.sessions.save(&credentials).await {
            Ok(()) => debug!(cookies = credentials.len(), "persisted session credentials"),
            Err(e) => warn!(error = %e, "could not persist session credentials"),
        }
    }

    pub(crate) fn enter(&mut self, phase: TickPhase) {
        if self.state.phase != phase {
            debug!(from = ?self.state.phase, to = ?phase, "tick phase");
            self.state.phase = phase;
        }
    }

    async fn publish(&self) {
        let last = self.state.last_snapshot.as_ref();
        self.status
            .publish(StatusReport {
                is_logged_in: self.state.login.is_authenticated(),
                last_scrape_time: last.map(|s| s.taken_at),
                last_send_time: self.state.last_send_time,
                total_scrapes: self.state.total_scrapes,
                scrape_errors: self.state.scrape_errors,
                items: last.map(|s| s.records.clone()).unwrap_or_default(),
            })
            .await;
    }

    /// Wait for in-flight notifications to finish or time out.
    pub async fn drain_notifications(&mut self) {
        self.dispatcher.drain().await;
    }

    /// Drain notifications and release the browser.
    pub async fn shutdown(&mut self) {
        let pending = self.dispatcher.pending();
        if pending > 0 {
            info!(pending, "waiting for notifications");
        }
        self.dispatcher.drain().await;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "browser did not close cleanly");
            }
        }
        self.enter(TickPhase::Idle);
        info!("scrape loop shut down");
    }
}
