use menuwatch_browser::BrowserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Page returned malformed rows: {0}")]
    MalformedRows(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
