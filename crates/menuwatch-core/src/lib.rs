//! Menuwatch Core - Foundation crate for the menuwatch monitor.
//!
//! This crate provides shared types, error handling, configuration management
//! and the time abstractions that all other menuwatch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Configuration error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Domain records (`DisabledRecord`, `ScrapeSnapshot`, `LoginState`, ...)
//! - [`clock`] - Injectable wall clock and sleep primitives
//!
//! # Example
//!
//! ```rust
//! use menuwatch_core::{AppConfig, DisabledRecord};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.scraping.error_threshold, 5);
//!
//! let pizza = DisabledRecord::item("Pizza", "", "12.00", None).expect("non-empty name");
//! assert_eq!(pizza.category(), "Uncategorized");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, RecordingSleeper, Sleeper, SystemClock, TokioSleeper};
pub use config::{
    AppConfig, BrowserConfig, ExtractorConfig, GeneralConfig, LoginConfig, MaterializerConfig,
    ScrapingConfig, SinkConfig,
};
pub use error::{ConfigError, ConfigResult};
pub use types::{
    DisabledRecord, LoginState, Recipient, RecordKind, ScrapeSnapshot, SessionCookie,
    SessionCredentials, UNCATEGORIZED,
};
