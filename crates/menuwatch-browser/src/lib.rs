//! Controlled browser handle for the monitored page.
//!
//! Wraps a single authenticated Chrome browsing context behind the
//! [`ControlledBrowser`] trait so the scrape loop can be driven by a fake in
//! tests, and provides [`ChromeLauncher`] for (re)launching the real thing.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;

pub use actions::{extract_domain, BrowserLauncher, ControlledBrowser};
pub use engine::{BrowserEngine, ChromeLauncher};
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
