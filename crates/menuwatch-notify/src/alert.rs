//! Alert message sink.

use crate::error::Result;
use async_trait::async_trait;
use futures::future::join_all;
use menuwatch_store::RecipientStore;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Body POSTed once per recipient.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Messaging chat identifier
    pub chat_id: String,
    /// Message text
    pub message: String,
}

/// What happened to one alert fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertReport {
    /// Sink credentials unset; nothing was sent
    pub skipped: bool,
    /// Recipients that answered with a 2xx status
    pub delivered: usize,
    /// Recipients that failed or answered non-2xx
    pub failed: usize,
}

/// Delivers a message to every active recipient.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Fan `message` out to the current recipient list.
    async fn alert(&self, message: &str) -> Result<AlertReport>;
}

/// POSTs [`AlertPayload`]s to a messaging endpoint.
pub struct HttpAlertSink {
    client: Client,
    url: Option<String>,
    token: Option<String>,
    recipients: Arc<RecipientStore>,
}

impl HttpAlertSink {
    /// Create a sink. `url` or `token` left unset disables delivery.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        url: Option<String>,
        token: Option<String>,
        recipients: Arc<RecipientStore>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.filter(|u| !u.trim().is_empty()),
            token: token.filter(|t| !t.trim().is_empty()),
            recipients,
        })
    }

    /// Whether both endpoint and credential are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }
}

#[async_trait]
impl AlertSink for HttpAlertSink {
    async fn alert(&self, message: &str) -> Result<AlertReport> {
        let (Some(url), Some(token)) = (&self.url, &self.token) else {
            debug!("alert sink credentials unset, skipping");
            return Ok(AlertReport {
                skipped: true,
                ..AlertReport::default()
            });
        };

        // Concurrent, so one stalled recipient cannot use up the others' budget.
        let recipients = self.recipients.active().await?;
        let sends = recipients.iter().map(|recipient| {
            let payload = AlertPayload {
                chat_id: recipient.chat_id.clone(),
                message: message.to_string(),
            };
            let request = self.client.post(url).bearer_auth(token).json(&payload);
            async move { (recipient, request.send().await) }
        });

        let mut report = AlertReport::default();
        for (recipient, result) in join_all(sends).await {
            match result {
                Ok(response) if response.status().is_success() => {
                    report.delivered += 1;
                }
                Ok(response) => {
                    warn!(
                        recipient = %recipient.name,
                        status = response.status().as_u16(),
                        "alert endpoint rejected message"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(recipient = %recipient.name, error = %e, "alert delivery failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
