//! Change detection and resend throttling for the tabular sink.
//!
//! A snapshot is forwarded when its fingerprint differs from the last one
//! sent, or when the resend interval has elapsed. Empty snapshots are never
//! forwarded. A send attempt advances the throttle whether or not delivery
//! succeeds.

use chrono::{DateTime, Duration, Utc};
use menuwatch_core::{DisabledRecord, ScrapeSnapshot};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Order-independent hash of the `(kind, name)` multiset.
pub fn fingerprint(records: &[DisabledRecord]) -> String {
    let mut keys: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.kind().as_str(), r.name()))
        .collect();
    keys.sort_unstable();

    let mut hasher = Sha256::new();
    for (kind, name) in keys {
        hasher.update(kind.as_bytes());
        hasher.update([0x1f]);
        hasher.update(name.as_bytes());
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}

/// Last-sent bookkeeping owned by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationState {
    pub last_sent_fingerprint: Option<String>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub min_resend_interval: Duration,
}

impl ReconciliationState {
    /// Nothing sent yet.
    pub fn new(min_resend_interval: Duration) -> Self {
        Self {
            last_sent_fingerprint: None,
            last_sent_at: None,
            min_resend_interval,
        }
    }
}

/// Why a snapshot was or was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Record set differs from the last one sent
    Changed,
    /// Unchanged, but the resend interval elapsed
    Resend,
    /// Unchanged and sent recently
    Throttled,
    /// Nothing disabled; presence only is reported
    Empty,
}

impl Decision {
    pub fn sends(&self) -> bool {
        matches!(self, Self::Changed | Self::Resend)
    }
}

/// Decide without side effects.
pub fn decide(snapshot: &ScrapeSnapshot, state: &ReconciliationState, now: DateTime<Utc>) -> Decision {
    if snapshot.is_empty() {
        return Decision::Empty;
    }
    let current = fingerprint(&snapshot.records);
    if state.last_sent_fingerprint.as_deref() != Some(current.as_str()) {
        return Decision::Changed;
    }
    match state.last_sent_at {
        Some(at) if now - at < state.min_resend_interval => Decision::Throttled,
        _ => Decision::Resend,
    }
}

/// Forward `snapshot` through `send` when warranted and return the new state.
pub fn reconcile<F>(
    snapshot: &ScrapeSnapshot,
    state: ReconciliationState,
    now: DateTime<Utc>,
    send: F,
) -> (ReconciliationState, Decision)
where
    F: FnOnce(&ScrapeSnapshot),
{
    let decision = decide(snapshot, &state, now);
    debug!(?decision, records = snapshot.records.len(), "reconciled snapshot");
    if !decision.sends() {
        return (state, decision);
    }

    send(snapshot);
    let next = ReconciliationState {
        last_sent_fingerprint: Some(fingerprint(&snapshot.records)),
        last_sent_at: Some(now),
        ..state
    };
    (next, decision)
}
