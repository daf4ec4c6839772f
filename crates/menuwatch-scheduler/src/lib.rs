//! Scrape loop and failure escalator for menuwatch.
//!
//! [`ScrapeLoop`] drives one tick at a time against the single controlled
//! browser:
//!
//! ```text
//! Idle -> Checking -> Scraping -> Idle
//!            |            |
//!         (expired)    (failure x threshold)
//!            v            v
//!          Idle       Reloading -> Restarting -> Idle
//! ```
//!
//! Loop state is owned by the loop itself. External readers get a
//! [`StatusHandle`] that is refreshed at the end of every tick.

pub mod error;
pub mod escalator;
pub mod scrape_loop;
pub mod state;
pub mod status;

pub use error::{LoopError, Result};
pub use escalator::Recovery;
pub use scrape_loop::{ScrapeLoop, TickOutcome, LOGIN_SCREENSHOT_FILE};
pub use state::{AlertLatch, LoopState, TickPhase};
pub use status::{StatusHandle, StatusReport};
