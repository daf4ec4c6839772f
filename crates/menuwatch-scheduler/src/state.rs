//! Loop-owned state: tick phase, alert latch, counters and the last good read.

use chrono::{DateTime, Utc};
use menuwatch_core::{LoginState, ScrapeSnapshot};
use menuwatch_scraper::ReconciliationState;

/// Where the current tick is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPhase {
    #[default]
    Idle,
    Checking,
    Scraping,
    Reloading,
    Restarting,
}

/// One-shot guard for the expiry alert.
///
/// Disarmed while the session is healthy. The first expired check arms it
/// and is the only one that alerts; it stays armed until an authenticated
/// check disarms it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertLatch {
    armed: bool,
}

impl AlertLatch {
    /// Arm the latch. True when it was disarmed, i.e. an alert is due.
    pub fn arm(&mut self) -> bool {
        !std::mem::replace(&mut self.armed, true)
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Everything the loop mutates between ticks.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub phase: TickPhase,
    pub login: LoginState,
    pub latch: AlertLatch,
    /// Index of the next tick, starting at 0
    pub tick_index: u64,
    pub consecutive_errors: u32,
    pub scrape_errors: u64,
    pub total_scrapes: u64,
    pub soft_reloads: u64,
    pub hard_restarts: u64,
    /// Set by a hard restart; the run loop resets its interval and clears it
    pub rearm_pending: bool,
    pub last_snapshot: Option<ScrapeSnapshot>,
    pub last_send_time: Option<DateTime<Utc>>,
    pub reconciliation: ReconciliationState,
}

impl LoopState {
    pub fn new(reconciliation: ReconciliationState) -> Self {
        Self {
            phase: TickPhase::Idle,
            login: LoginState::Unknown,
            latch: AlertLatch::default(),
            tick_index: 0,
            consecutive_errors: 0,
            scrape_errors: 0,
            total_scrapes: 0,
            soft_reloads: 0,
            hard_restarts: 0,
            rearm_pending: false,
            last_snapshot: None,
            last_send_time: None,
            reconciliation,
        }
    }

    /// Take the pending rearm request, if any.
    pub fn take_rearm(&mut self) -> bool {
        std::mem::take(&mut self.rearm_pending)
    }
}

/// Full materialization runs on ticks `0, every, 2 * every, ...`.
pub fn should_materialize(tick_index: u64, every: u64) -> bool {
    every > 0 && tick_index % every == 0
}

/// Cache clearing runs on ticks `every, 2 * every, ...`, never the first.
pub fn should_clear_cache(tick_index: u64, every: u64) -> bool {
    every > 0 && tick_index > 0 && tick_index % every == 0
}
