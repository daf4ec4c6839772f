use menuwatch_browser::BrowserError;
use menuwatch_scraper::ScrapeError;
use std::time::Duration;
use thiserror::Error;

/// A failure inside one tick or one recovery action.
///
/// Never escapes [`crate::ScrapeLoop::tick`]; it is logged and folded into
/// the loop's counters.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },

    #[error("No browser is running")]
    NoBrowser,
}

pub type Result<T> = std::result::Result<T, LoopError>;
