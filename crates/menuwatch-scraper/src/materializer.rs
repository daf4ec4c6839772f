//! List materializer.
//!
//! Forces a virtualized list to render every row by scrolling in fixed
//! steps until the content height stops growing or the step cap is hit.
//! Best effort: step failures end the loop early and are only logged.

use crate::script;
use menuwatch_browser::ControlledBrowser;
use menuwatch_core::{MaterializerConfig, Sleeper};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How a materialization pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Scroll steps taken
    pub steps: u32,
    /// Height stayed unchanged for the configured number of rounds
    pub converged: bool,
    /// Scroll offset was restored to the origin
    pub reset: bool,
}

/// Drives the scroll-wait-measure loop.
pub struct Materializer {
    config: MaterializerConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl Materializer {
    pub fn new(config: MaterializerConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    /// Scroll the list to the end, then back to the origin.
    pub async fn materialize_list(&self, browser: &dyn ControlledBrowser) -> MaterializeReport {
        let selector = &self.config.container_selector;
        let step_script = script::scroll_step(selector, self.config.scroll_delta_px);
        let measure_script = script::measure(selector);
        let settle = Duration::from_millis(self.config.settle_ms);

        let mut steps = 0;
        let mut converged = false;
        let mut last_height: Option<f64> = None;
        let mut unchanged = 0;

        while steps < self.config.max_steps {
            if let Err(e) = browser.evaluate(&step_script).await {
                warn!(error = %e, steps, "scroll step failed, stopping materialization");
                break;
            }
            steps += 1;
            self.sleeper.sleep(settle).await;

            let height = match browser.evaluate(&measure_script).await {
                Ok(value) => value.as_f64(),
                Err(e) => {
                    warn!(error = %e, steps, "height measurement failed, stopping materialization");
                    break;
                }
            };

            if height.is_some() && height == last_height {
                unchanged += 1;
                if unchanged >= self.config.stable_rounds {
                    converged = true;
                    break;
                }
            } else {
                unchanged = 0;
                last_height = height;
            }
        }

        let reset = match browser.evaluate(&script::scroll_reset(selector)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "could not restore scroll position");
                false
            }
        };

        debug!(steps, converged, height = ?last_height, "materialized list");
        MaterializeReport {
            steps,
            converged,
            reset,
        }
    }
}
