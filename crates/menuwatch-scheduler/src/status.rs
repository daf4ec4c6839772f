//! Read-only status surface for external UIs.

use chrono::{DateTime, Utc};
use menuwatch_core::DisabledRecord;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What an operator sees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub is_logged_in: bool,
    pub last_scrape_time: Option<DateTime<Utc>>,
    pub last_send_time: Option<DateTime<Utc>>,
    /// Successful extraction passes
    pub total_scrapes: u64,
    /// Failed extraction passes since start
    pub scrape_errors: u64,
    /// Records from the most recent successful pass
    pub items: Vec<DisabledRecord>,
}

/// Shared handle to the latest [`StatusReport`].
///
/// Written only by the scrape loop at the end of each tick.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    inner: Arc<RwLock<StatusReport>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current report.
    pub async fn read(&self) -> StatusReport {
        self.inner.read().await.clone()
    }

    pub(crate) async fn publish(&self, report: StatusReport) {
        *self.inner.write().await = report;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = StatusReport {
            is_logged_in: true,
            total_scrapes: 3,
            ..StatusReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["isLoggedIn"], true);
        assert_eq!(json["totalScrapes"], 3);
        assert_eq!(json["scrapeErrors"], 0);
        assert!(json["lastScrapeTime"].is_null());
        assert!(json["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let handle = StatusHandle::new();
        let reader = handle.clone();
        handle
            .publish(StatusReport {
                scrape_errors: 2,
                ..StatusReport::default()
            })
            .await;
        assert_eq!(reader.read().await.scrape_errors, 2);
    }
}
