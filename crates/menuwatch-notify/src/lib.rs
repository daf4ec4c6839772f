//! Notification sinks for menuwatch.
//!
//! Two independent HTTP push targets:
//!
//! - [`TabularSink`] receives the full disabled-record set as rows for a
//!   spreadsheet endpoint.
//! - [`AlertSink`] delivers a short message to every active recipient.
//!
//! Delivery is best effort. [`Dispatcher`] spawns each send as its own task,
//! bounds it with a timeout and only logs the outcome; nothing here retries.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod alert;
pub mod dispatch;
pub mod error;
pub mod tabular;

pub use alert::{AlertPayload, AlertReport, AlertSink, HttpAlertSink};
pub use dispatch::Dispatcher;
pub use error::{NotifyError, Result};
pub use tabular::{HttpTabularSink, TabularPayload, TabularSink, UPDATE_DISABLED_ACTION};
