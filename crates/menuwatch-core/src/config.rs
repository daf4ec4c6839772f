//! Configuration management for menuwatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/menuwatch/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Tick scheduling and escalation settings
    pub scraping: ScrapingConfig,
    /// List materialization settings
    pub materializer: MaterializerConfig,
    /// Login detection markers
    pub login: LoginConfig,
    /// Extraction selectors
    pub extractor: ExtractorConfig,
    /// Notification sink settings
    pub sinks: SinkConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `MENUWATCH_TARGET_URL`: page to monitor
    /// - `MENUWATCH_HEADLESS`: browser headless mode (true/false)
    /// - `MENUWATCH_INTERVAL_SECS`: tick interval
    /// - `MENUWATCH_TABULAR_URL`: tabular sink endpoint
    /// - `MENUWATCH_ALERT_URL`: alert sink endpoint
    /// - `MENUWATCH_ALERT_TOKEN`: alert sink credential
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("MENUWATCH_TARGET_URL") {
            tracing::debug!("Override general.target_url from env");
            self.general.target_url = val;
        }

        if let Some(val) = lookup("MENUWATCH_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("MENUWATCH_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.scraping.interval_secs = secs;
                tracing::debug!("Override scraping.interval_secs from env: {}", secs);
            }
        }

        if let Some(val) = lookup("MENUWATCH_TABULAR_URL") {
            self.sinks.tabular_url = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = lookup("MENUWATCH_ALERT_URL") {
            self.sinks.alert_url = Some(val).filter(|v| !v.is_empty());
        }

        if let Some(val) = lookup("MENUWATCH_ALERT_TOKEN") {
            self.sinks.alert_token = Some(val).filter(|v| !v.is_empty());
        }
    }

    /// Reject values the scrape loop cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let target = self.general.target_url.trim();
        if target.is_empty() {
            return Err(invalid("general.target_url", "must be set"));
        }
        let parsed = url::Url::parse(target)
            .map_err(|e| invalid("general.target_url", &format!("invalid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("general.target_url", "must use http or https"));
        }

        let positives = [
            ("scraping.interval_secs", self.scraping.interval_secs),
            ("scraping.materialize_every", self.scraping.materialize_every),
            ("scraping.cache_clear_every", self.scraping.cache_clear_every),
            ("scraping.error_threshold", u64::from(self.scraping.error_threshold)),
            ("materializer.max_steps", u64::from(self.materializer.max_steps)),
            ("materializer.stable_rounds", u64::from(self.materializer.stable_rounds)),
        ];
        for (field, value) in positives {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/menuwatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Directory for persisted session and recipient blobs.
    ///
    /// `general.data_dir` wins; otherwise `~/.local/share/menuwatch`.
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.general.data_dir {
            return Ok(dir.clone());
        }
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "menuwatch", "menuwatch").ok_or(ConfigError::NoConfigDir)
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Authenticated page to monitor
    pub target_url: String,
    /// Override for the data directory
    pub data_dir: Option<PathBuf>,
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation and reload timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Persistent Chrome profile directory
    pub user_data_dir: Option<PathBuf>,
    /// Explicit Chrome executable
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1440,
            window_height: 900,
            navigation_timeout_secs: 45,
            user_data_dir: None,
            chrome_executable: None,
        }
    }
}

impl BrowserConfig {
    /// Navigation timeout as a `Duration`.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

/// Tick scheduling and failure escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Delay before the first tick
    pub startup_delay_secs: u64,
    /// Fully materialize the list every Nth tick
    pub materialize_every: u64,
    /// Clear the browser cache every Nth tick
    pub cache_clear_every: u64,
    /// Consecutive failures before a soft reload
    pub error_threshold: u32,
    /// Soft reload timeout in seconds
    pub reload_timeout_secs: u64,
    /// Extraction timeout in seconds
    pub extract_timeout_secs: u64,
    /// Materialization timeout in seconds
    pub materialize_timeout_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            startup_delay_secs: 5,
            materialize_every: 5,
            cache_clear_every: 50,
            error_threshold: 5,
            reload_timeout_secs: 30,
            extract_timeout_secs: 30,
            materialize_timeout_secs: 120,
        }
    }
}

/// List materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    /// Scroll container; the document is used when it matches nothing
    pub container_selector: String,
    /// Step cap
    pub max_steps: u32,
    /// Pixels per scroll step
    pub scroll_delta_px: u32,
    /// Wait after each step in milliseconds
    pub settle_ms: u64,
    /// Unchanged-height rounds that count as converged
    pub stable_rounds: u32,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            container_selector: r#"[data-testid="menu-scroll-container"]"#.to_string(),
            max_steps: 40,
            scroll_delta_px: 800,
            settle_ms: 400,
            stable_rounds: 3,
        }
    }
}

/// Login page markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// URL substrings that indicate a login page
    pub url_markers: Vec<String>,
    /// Selector for an email input
    pub email_selector: String,
    /// Visible copy that indicates a sign-in prompt (case-insensitive)
    pub sign_in_phrases: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            url_markers: ["login", "signin", "sign-in", "auth"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            email_selector: r#"input[type="email"]"#.to_string(),
            sign_in_phrases: vec!["sign in".to_string(), "log in".to_string()],
        }
    }
}

/// Selectors and normalization used by the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Every row of the list, headers included, in document order
    pub row_selector: String,
    /// Matches rows (or descendants) that are category headers
    pub category_header_selector: String,
    /// Status tag labels within a row
    pub tag_selector: String,
    /// Item name
    pub name_selector: String,
    /// Item description
    pub description_selector: String,
    /// Item price
    pub price_selector: String,
    /// Option group title within a choice row
    pub choice_group_selector: String,
    /// Primary selector for disabled choice spans
    pub disabled_choice_selector: String,
    /// Secondary heuristic used when the primary selector finds nothing
    pub fallback_choice_selector: String,
    /// Currency token stripped from prices
    pub currency_marker: String,
    /// Whether the secondary heuristic is consulted at all
    pub fallback_enabled: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            row_selector: r#"[data-testid="menu-row"]"#.to_string(),
            category_header_selector: r#"[data-testid="category-header"]"#.to_string(),
            tag_selector: r#"[data-testid="tag"]"#.to_string(),
            name_selector: r#"[data-testid="item-name"]"#.to_string(),
            description_selector: r#"[data-testid="item-description"]"#.to_string(),
            price_selector: r#"[data-testid="item-price"]"#.to_string(),
            choice_group_selector: r#"[data-testid="option-group-name"]"#.to_string(),
            disabled_choice_selector: r#"span[data-disabled="true"]"#.to_string(),
            fallback_choice_selector: r#"span[class*="disabled"], span[disabled]"#.to_string(),
            currency_marker: "$".to_string(),
            fallback_enabled: true,
        }
    }
}

/// Notification sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Tabular (spreadsheet) endpoint
    pub tabular_url: Option<String>,
    /// Alert message endpoint
    pub alert_url: Option<String>,
    /// Alert endpoint credential (never written to disk)
    #[serde(skip_serializing)]
    pub alert_token: Option<String>,
    /// Resend an unchanged record set after this many seconds
    pub min_resend_secs: u64,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            tabular_url: None,
            alert_url: None,
            alert_token: None,
            min_resend_secs: 3600,
            request_timeout_secs: 20,
        }
    }
}

impl SinkConfig {
    /// Per-request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
