//! Recovery after repeated scrape failures.
//!
//! A soft reload is tried first. If it fails or times out the browser is
//! torn down and relaunched. The consecutive-error counter resets after
//! either path regardless of its outcome.

use crate::error::{LoopError, Result};
use crate::scrape_loop::ScrapeLoop;
use crate::state::TickPhase;
use menuwatch_core::SessionCredentials;
use std::time::Duration;
use tracing::{error, info, warn};

/// Which recovery path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Reloaded,
    Restarted,
    RestartFailed,
}

impl ScrapeLoop {
    pub(crate) async fn escalate(&mut self) -> Recovery {
        warn!(
            errors = self.state.consecutive_errors,
            "error threshold reached, reloading page"
        );

        self.enter(TickPhase::Reloading);
        self.state.soft_reloads += 1;
        let recovery = match self.soft_reload().await {
            Ok(()) => {
                info!("soft reload succeeded");
                Recovery::Reloaded
            }
            Err(e) => {
                warn!(error = %e, "soft reload failed, restarting browser");
                self.enter(TickPhase::Restarting);
                match self.restart().await {
                    Ok(()) => Recovery::Restarted,
                    Err(e) => {
                        error!(error = %e, "browser restart failed");
                        Recovery::RestartFailed
                    }
                }
            }
        };

        self.state.consecutive_errors = 0;
        recovery
    }

    async fn soft_reload(&self) -> Result<()> {
        let browser = self.browser.as_deref().ok_or(LoopError::NoBrowser)?;
        let after = Duration::from_secs(self.scraping.reload_timeout_secs);
        tokio::time::timeout(after, browser.reload())
            .await
            .map_err(|_| LoopError::Timeout {
                stage: "reload",
                after,
            })??;
        Ok(())
    }

    /// Tear down and relaunch the browser.
    ///
    /// A rearm of the periodic timer is requested afterwards, whether or not
    /// the relaunch worked.
    pub(crate) async fn restart(&mut self) -> Result<()> {
        self.state.hard_restarts += 1;

        if let Some(mut old) = self.browser.take() {
            if let Err(e) = old.close().await {
                warn!(error = %e, "old browser did not close cleanly");
            }
        }
        let result = self.bring_up().await;

        self.state.rearm_pending = true;
        if result.is_ok() {
            info!(restarts = self.state.hard_restarts, "browser restarted");
        }
        result
    }

    /// Launch, reapply persisted credentials and open the target page.
    ///
    /// The new handle is kept once the launch succeeds, even if a later
    /// step fails; the next login check decides whether it is usable.
    pub(crate) async fn bring_up(&mut self) -> Result<()> {
        let launched = self.launcher.launch().await?;
        let browser = self.browser.insert(launched);

        let credentials = match self.sessions.load().await {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "stored session unreadable, starting without it");
                SessionCredentials::new()
            }
        };
        browser.set_cookies(&credentials).await?;
        browser.navigate(&self.target_url).await?;
        info!(cookies = credentials.len(), "browser ready");
        Ok(())
    }
}
