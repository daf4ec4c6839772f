//! Page-level scraping stages for menuwatch.
//!
//! Each stage is a small component over a [`menuwatch_browser::ControlledBrowser`]:
//!
//! - [`SessionMonitor`] classifies the page as authenticated or expired
//! - [`Materializer`] scrolls a virtualized list until every row is rendered
//! - [`Extractor`] folds the rendered rows into disabled records
//! - [`reconciler`] decides whether a snapshot is worth forwarding
//!
//! The page scripts live in [`script`] and carry a leading tag comment so a
//! fake browser can tell them apart.

pub mod error;
pub mod extractor;
pub mod login;
pub mod materializer;
pub mod reconciler;
pub mod script;

pub use error::{Result, ScrapeError};
pub use extractor::{
    fold_rows, ChoiceFallback, Extractor, NoFallback, RawRow, RowStatus,
    SecondarySelectorFallback,
};
pub use login::{LoginProbe, SessionMonitor};
pub use materializer::{MaterializeReport, Materializer};
pub use reconciler::{fingerprint, reconcile, Decision, ReconciliationState};
