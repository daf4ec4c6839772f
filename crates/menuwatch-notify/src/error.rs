//! Error types for the notification sinks.

use thiserror::Error;

/// Errors that can occur while pushing a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport failure (connect, TLS, body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Recipient list could not be read
    #[error("recipient store error: {0}")]
    Store(#[from] menuwatch_store::StoreError),

    /// Sink is not configured
    #[error("sink not configured: {0}")]
    NotConfigured(String),
}

/// Result type alias using `NotifyError`.
pub type Result<T> = std::result::Result<T, NotifyError>;
