//! In-memory browser, launcher and sinks for driving the scrape loop.

#![allow(dead_code)]

use async_trait::async_trait;
use menuwatch_browser::{BrowserError, BrowserLauncher, ControlledBrowser, Result as BrowserResult};
use menuwatch_core::{AppConfig, ManualClock, RecordingSleeper, SessionCookie, SessionCredentials};
use menuwatch_notify::{AlertReport, AlertSink, Result as NotifyResult, TabularPayload, TabularSink};
use menuwatch_scheduler::ScrapeLoop;
use menuwatch_scraper::script;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

pub const TARGET_URL: &str = "https://merchants.example.com/store/menu";
pub const LOGIN_URL: &str = "https://merchants.example.com/login?next=/store/menu";

/// Everything the fake page knows and records.
pub struct PageState {
    pub logged_in: bool,
    pub rows: Value,
    pub extract_fails: bool,
    pub extract_hangs: bool,
    pub reload_fails: bool,
    pub cookies: SessionCredentials,
    pub applied_cookies: Vec<SessionCredentials>,
    pub navigations: Vec<String>,
    pub extractions: usize,
    pub reloads: usize,
    pub cache_clears: usize,
    pub scroll_resets: usize,
    pub screenshots: usize,
    pub closes: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            logged_in: true,
            rows: json!([]),
            extract_fails: false,
            extract_hangs: false,
            reload_fails: false,
            cookies: SessionCredentials::new(),
            applied_cookies: Vec::new(),
            navigations: Vec::new(),
            extractions: 0,
            reloads: 0,
            cache_clears: 0,
            scroll_resets: 0,
            screenshots: 0,
            closes: 0,
        }
    }
}

impl PageState {
    fn url(&self) -> &'static str {
        if self.logged_in {
            TARGET_URL
        } else {
            LOGIN_URL
        }
    }

    /// `None` means the script never returns.
    fn respond(&mut self, source: &str) -> Option<BrowserResult<Value>> {
        let response = if source.starts_with(script::LOGIN_PROBE_TAG) {
            Ok(json!({
                "url": self.url(),
                "hasEmailInput": !self.logged_in,
                "hasSignInCopy": false,
            }))
        } else if source.starts_with(script::SCROLL_STEP_TAG) {
            Ok(json!(800))
        } else if source.starts_with(script::MEASURE_TAG) {
            Ok(json!(2400))
        } else if source.starts_with(script::SCROLL_RESET_TAG) {
            self.scroll_resets += 1;
            Ok(json!(0))
        } else if source.starts_with(script::EXTRACT_TAG) {
            self.extractions += 1;
            if self.extract_hangs {
                return None;
            }
            if self.extract_fails {
                Err(BrowserError::JsEvalFailed("row container missing".to_string()))
            } else {
                Ok(self.rows.clone())
            }
        } else {
            Err(BrowserError::JsEvalFailed("unexpected script".to_string()))
        };
        Some(response)
    }
}

pub type SharedPage = Arc<Mutex<PageState>>;

pub struct FakeBrowser {
    page: SharedPage,
}

impl FakeBrowser {
    fn page(&self) -> MutexGuard<'_, PageState> {
        self.page.lock().unwrap()
    }
}

#[async_trait]
impl ControlledBrowser for FakeBrowser {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.page().navigations.push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<String> {
        Ok(self.page().url().to_string())
    }

    async fn evaluate(&self, source: &str) -> BrowserResult<Value> {
        let response = self.page().respond(source);
        match response {
            Some(result) => result,
            None => {
                std::future::pending::<()>().await;
                Ok(Value::Null)
            }
        }
    }

    async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
        self.page().screenshots += 1;
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn cookies(&self) -> BrowserResult<SessionCredentials> {
        Ok(self.page().cookies.clone())
    }

    async fn set_cookies(&self, credentials: &SessionCredentials) -> BrowserResult<()> {
        self.page().applied_cookies.push(credentials.clone());
        Ok(())
    }

    async fn reload(&self) -> BrowserResult<()> {
        let mut page = self.page();
        page.reloads += 1;
        if page.reload_fails {
            return Err(BrowserError::NavigationError("net::ERR_CONNECTION_RESET".to_string()));
        }
        Ok(())
    }

    async fn clear_cache(&self) -> BrowserResult<()> {
        self.page().cache_clears += 1;
        Ok(())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.page().closes += 1;
        Ok(())
    }
}

/// Hands out browsers that all drive the same [`PageState`].
pub struct FakeLauncher {
    page: SharedPage,
    launches: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeLauncher {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> BrowserResult<Box<dyn ControlledBrowser>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BrowserError::ChromiumError("chrome exited early".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowser {
            page: self.page.clone(),
        }))
    }
}

#[derive(Default)]
pub struct RecordingTable {
    pub payloads: Mutex<Vec<TabularPayload>>,
}

#[async_trait]
impl TabularSink for RecordingTable {
    async fn push(&self, payload: &TabularPayload) -> NotifyResult<u16> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(200)
    }
}

#[derive(Default)]
pub struct RecordingAlert {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl AlertSink for RecordingAlert {
    async fn alert(&self, message: &str) -> NotifyResult<AlertReport> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(AlertReport {
            delivered: 1,
            ..AlertReport::default()
        })
    }
}

pub struct Harness {
    pub page: SharedPage,
    pub launcher: Arc<FakeLauncher>,
    pub table: Arc<RecordingTable>,
    pub alerts: Arc<RecordingAlert>,
    pub clock: Arc<ManualClock>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let page: SharedPage = Arc::new(Mutex::new(PageState::default()));
        let start = chrono::DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        Self {
            launcher: Arc::new(FakeLauncher {
                page: page.clone(),
                launches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }),
            page,
            table: Arc::new(RecordingTable::default()),
            alerts: Arc::new(RecordingAlert::default()),
            clock: Arc::new(ManualClock::new(start)),
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.general.target_url = TARGET_URL.to_string();
        config
    }

    pub fn build(&self, config: &AppConfig) -> ScrapeLoop {
        ScrapeLoop::new(
            config,
            self.dir.path(),
            self.launcher.clone(),
            self.alerts.clone(),
        )
        .with_tabular_sink(self.table.clone())
        .with_clock(self.clock.clone())
        .with_sleeper(Arc::new(RecordingSleeper::new()))
    }

    pub fn page(&self) -> MutexGuard<'_, PageState> {
        self.page.lock().unwrap()
    }

    pub fn table_calls(&self) -> usize {
        self.table.payloads.lock().unwrap().len()
    }

    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts.messages.lock().unwrap().clone()
    }
}

/// A header row followed by one disabled item.
pub fn pizza_rows() -> Value {
    json!([
        { "header": "Mains" },
        { "tags": ["DISABLED"], "name": "Pizza", "description": "Cheese", "price": "$12.00" },
        { "tags": ["POPULAR"], "name": "Salad", "description": "", "price": "$8.00" }
    ])
}

pub fn session_cookie(name: &str) -> SessionCookie {
    SessionCookie {
        name: name.to_string(),
        value: "token".to_string(),
        domain: ".example.com".to_string(),
        path: "/".to_string(),
        expires: None,
        http_only: true,
        secure: true,
    }
}
