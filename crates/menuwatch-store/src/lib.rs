//! Persistent stores for menuwatch.
//!
//! Both stores keep a single JSON document on disk and rewrite it atomically
//! (write to a sibling temp file, then rename).
//!
//! - [`SessionStore`] holds the browser's session credentials between runs.
//! - [`RecipientStore`] holds the ordered list of alert recipients.

pub mod error;
pub mod recipients;
pub mod session;

mod blob;

pub use error::{Result, StoreError};
pub use recipients::RecipientStore;
pub use session::SessionStore;
