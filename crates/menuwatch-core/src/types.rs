//! Shared types used across menuwatch.
//!
//! Records produced by the extractor, the snapshot that wraps one pass,
//! login state, persisted session credentials and alert recipients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category assigned to rows that appear before any category header.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Kind of disabled entity observed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A standalone menu item
    Item,
    /// A single choice inside an option group
    Option,
}

impl RecordKind {
    /// Stable lowercase label, also used when fingerprinting.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Option => "option",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed disabled entity.
///
/// Constructed only through [`DisabledRecord::item`] and
/// [`DisabledRecord::option`], which drop empty names and option records
/// without a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledRecord {
    kind: RecordKind,
    name: String,
    description: Option<String>,
    price: Option<String>,
    category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    option_group: Option<String>,
}

impl DisabledRecord {
    /// Build a standalone disabled item.
    ///
    /// Returns `None` when `name` is empty after trimming. Empty
    /// `description`/`price` strings become `None`.
    #[must_use]
    pub fn item(name: &str, description: &str, price: &str, category: Option<&str>) -> Option<Self> {
        let name = non_empty(name)?;
        Some(Self {
            kind: RecordKind::Item,
            name,
            description: non_empty(description),
            price: non_empty(price),
            category: category_or_default(category),
            option_group: None,
        })
    }

    /// Build a disabled choice inside an option group.
    ///
    /// Returns `None` when either `name` or `group` is empty after trimming.
    #[must_use]
    pub fn option(name: &str, group: &str, price: &str, category: Option<&str>) -> Option<Self> {
        let name = non_empty(name)?;
        let group = non_empty(group)?;
        Some(Self {
            kind: RecordKind::Option,
            name,
            description: None,
            price: non_empty(price),
            category: category_or_default(category),
            option_group: Some(group),
        })
    }

    /// Record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Trimmed, non-empty name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, if the row carried one.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Normalized price text, if any.
    #[must_use]
    pub fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }

    /// Running category inherited from the closest preceding header.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Option group title; always `Some` for [`RecordKind::Option`].
    #[must_use]
    pub fn option_group(&self) -> Option<&str> {
        self.option_group.as_deref()
    }

    /// The `(kind, name)` identity used for change detection.
    #[must_use]
    pub fn identity(&self) -> (RecordKind, &str) {
        (self.kind, &self.name)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn category_or_default(category: Option<&str>) -> String {
    category
        .and_then(non_empty)
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

/// Result of one extraction pass.
///
/// Only the most recent snapshot is kept in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeSnapshot {
    /// Records in document order
    pub records: Vec<DisabledRecord>,
    /// When the pass completed
    pub taken_at: DateTime<Utc>,
    /// Monotonic pass counter (1 for the first successful pass)
    pub scrape_number: u64,
}

impl ScrapeSnapshot {
    /// Create a snapshot.
    #[must_use]
    pub fn new(records: Vec<DisabledRecord>, taken_at: DateTime<Utc>, scrape_number: u64) -> Self {
        Self {
            records,
            taken_at,
            scrape_number,
        }
    }

    /// True when the pass found nothing disabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Authentication state of the controlled browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginState {
    /// No check has run yet
    #[default]
    Unknown,
    /// The monitored page is reachable with the current session
    Authenticated,
    /// The page fell back to a login prompt, or the check failed
    Expired,
}

impl LoginState {
    /// True only for [`LoginState::Authenticated`].
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// One cookie-equivalent session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    /// Cookie name
    pub name: String,
    /// Opaque value
    pub value: String,
    /// Owning domain
    pub domain: String,
    /// Path scope
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiry in seconds since the Unix epoch; `None` for session cookies
    #[serde(default)]
    pub expires: Option<f64>,
    /// HTTP-only flag
    #[serde(default)]
    pub http_only: bool,
    /// Secure flag
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// An unordered set of session tokens.
///
/// Tokens are keyed by `(domain, path, name)`; inserting a token with an
/// existing key replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<SessionCookie>", into = "Vec<SessionCookie>")]
pub struct SessionCredentials {
    cookies: BTreeMap<(String, String, String), SessionCookie>,
}

impl SessionCredentials {
    /// Empty credential set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a token.
    pub fn insert(&mut self, cookie: SessionCookie) {
        let key = (cookie.domain.clone(), cookie.path.clone(), cookie.name.clone());
        self.cookies.insert(key, cookie);
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// True when no tokens are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterate tokens in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SessionCookie> {
        self.cookies.values()
    }
}

impl From<Vec<SessionCookie>> for SessionCredentials {
    fn from(cookies: Vec<SessionCookie>) -> Self {
        let mut set = Self::new();
        for cookie in cookies {
            set.insert(cookie);
        }
        set
    }
}

impl From<SessionCredentials> for Vec<SessionCookie> {
    fn from(set: SessionCredentials) -> Self {
        set.cookies.into_values().collect()
    }
}

impl FromIterator<SessionCookie> for SessionCredentials {
    fn from_iter<I: IntoIterator<Item = SessionCookie>>(iter: I) -> Self {
        let mut set = Self::new();
        for cookie in iter {
            set.insert(cookie);
        }
        set
    }
}

/// A person who receives expiry alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Stable identifier (UUID v4)
    pub id: String,
    /// Display name
    pub name: String,
    /// Messaging chat identifier
    pub chat_id: String,
    /// Whether alerts are delivered to this recipient
    pub active: bool,
}

impl Recipient {
    /// Create an active recipient with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            chat_id: chat_id.into(),
            active: true,
        }
    }

    /// Active and addressable.
    #[must_use]
    pub fn receives_alerts(&self) -> bool {
        self.active && !self.chat_id.trim().is_empty()
    }
}
