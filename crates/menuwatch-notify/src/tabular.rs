//! Tabular (spreadsheet) sink.

use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use menuwatch_core::{DisabledRecord, ScrapeSnapshot};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Action tag understood by the spreadsheet endpoint.
pub const UPDATE_DISABLED_ACTION: &str = "update_disabled";

/// Body POSTed to the tabular sink.
#[derive(Debug, Clone, Serialize)]
pub struct TabularPayload {
    /// Always [`UPDATE_DISABLED_ACTION`]
    pub action: &'static str,
    /// ISO-8601 time of the snapshot
    pub timestamp: String,
    /// Records in document order
    pub items: Vec<DisabledRecord>,
}

impl TabularPayload {
    /// Build the payload for a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ScrapeSnapshot) -> Self {
        Self {
            action: UPDATE_DISABLED_ACTION,
            timestamp: snapshot.taken_at.to_rfc3339(),
            items: snapshot.records.clone(),
        }
    }
}

/// Receives the disabled-record set.
#[async_trait]
pub trait TabularSink: Send + Sync {
    /// Push one payload and return the HTTP status the endpoint answered with.
    async fn push(&self, payload: &TabularPayload) -> Result<u16>;
}

/// POSTs payloads as JSON to a fixed URL.
pub struct HttpTabularSink {
    client: Client,
    url: String,
}

impl HttpTabularSink {
    /// Create a sink for `url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(NotifyError::NotConfigured("tabular sink URL".to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl TabularSink for HttpTabularSink {
    async fn push(&self, payload: &TabularPayload) -> Result<u16> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status().as_u16();
        debug!(status, items = payload.items.len(), "tabular sink answered");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_payload_shape() {
        let taken_at = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).unwrap();
        let records = vec![
            DisabledRecord::item("Pizza", "Wood fired", "12.00", Some("Mains")).unwrap(),
            DisabledRecord::option("Olives", "Toppings", "", Some("Mains")).unwrap(),
        ];
        let snapshot = ScrapeSnapshot::new(records, taken_at, 7);

        let json = serde_json::to_value(TabularPayload::from_snapshot(&snapshot)).unwrap();
        assert_eq!(json["action"], "update_disabled");
        assert_eq!(json["timestamp"], "2026-03-01T18:30:00+00:00");
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["items"][0]["name"], "Pizza");
        assert_eq!(json["items"][1]["optionGroup"], "Toppings");
    }

    #[test]
    fn test_sink_requires_url() {
        assert!(matches!(
            HttpTabularSink::new("", Duration::from_secs(5)),
            Err(NotifyError::NotConfigured(_))
        ));
        assert!(HttpTabularSink::new("https://sheets.example.com/hook", Duration::from_secs(5)).is_ok());
    }
}
