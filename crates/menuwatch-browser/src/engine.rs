use crate::actions::{extract_domain, BrowserLauncher, ControlledBrowser};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCacheParams, Cookie, CookieParam, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::stream::StreamExt;
use menuwatch_core::{BrowserConfig, SessionCookie, SessionCredentials};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Chrome-backed browsing context driven over CDP.
pub struct BrowserEngine {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl BrowserEngine {
    /// Launch Chrome with the given settings and open a blank page
    pub async fn launch(config: &BrowserConfig, fingerprint: &FingerprintConfig) -> Result<Self> {
        let mut builder = CdpBrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(fingerprint.user_agent_arg());

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        if let Some(exe) = &config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }

        let cdp_config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        info!(
            headless = config.headless,
            width = fingerprint.viewport_width,
            height = fingerprint.viewport_height,
            "launched browser"
        );

        Ok(Self {
            browser: Some(browser),
            page,
            handler,
            navigation_timeout: config.navigation_timeout(),
        })
    }

    async fn within<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.navigation_timeout, fut)
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!("{what} after {:?}", self.navigation_timeout))
            })?
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl ControlledBrowser for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        let domain = extract_domain(url)?;
        self.within("navigation", async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
            let _ = self.page.wait_for_navigation().await;
            Ok(())
        })
        .await?;
        debug!(domain = %domain, "navigated");
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value::<serde_json::Value>()
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }

    async fn cookies(&self) -> Result<SessionCredentials> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| BrowserError::CookieError(e.to_string()))?;
        Ok(cookies.into_iter().map(to_session_cookie).collect())
    }

    async fn set_cookies(&self, credentials: &SessionCredentials) -> Result<()> {
        if credentials.is_empty() {
            return Ok(());
        }
        let params = credentials
            .iter()
            .map(to_cookie_param)
            .collect::<Result<Vec<_>>>()?;
        let count = params.len();
        self.page
            .set_cookies(params)
            .await
            .map_err(|e| BrowserError::CookieError(e.to_string()))?;
        debug!(count, "applied session cookies");
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.within("reload", async {
            self.page
                .reload()
                .await
                .map_err(|e| BrowserError::NavigationError(e.to_string()))?;
            let _ = self.page.wait_for_navigation().await;
            Ok(())
        })
        .await
    }

    async fn clear_cache(&self) -> Result<()> {
        self.page
            .execute(ClearBrowserCacheParams::default())
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        if let Err(e) = browser.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }
        let _ = browser.wait().await;
        self.handler.abort();
        info!("closed browser");
        Ok(())
    }
}

fn to_session_cookie(cookie: Cookie) -> SessionCookie {
    SessionCookie {
        name: cookie.name,
        value: cookie.value,
        domain: cookie.domain,
        path: cookie.path,
        expires: (!cookie.session && cookie.expires > 0.0).then_some(cookie.expires),
        http_only: cookie.http_only,
        secure: cookie.secure,
    }
}

fn to_cookie_param(cookie: &SessionCookie) -> Result<CookieParam> {
    let mut builder = CookieParam::builder()
        .name(cookie.name.clone())
        .value(cookie.value.clone())
        .domain(cookie.domain.clone())
        .path(cookie.path.clone())
        .http_only(cookie.http_only)
        .secure(cookie.secure);
    if let Some(expires) = cookie.expires {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    builder.build().map_err(BrowserError::CookieError)
}

/// Launches [`BrowserEngine`]s with a fixed per-process fingerprint.
pub struct ChromeLauncher {
    config: BrowserConfig,
    fingerprint: FingerprintConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        let fingerprint = FingerprintConfig::randomized(config.window_width, config.window_height);
        Self {
            config,
            fingerprint,
        }
    }
}

#[async_trait::async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn ControlledBrowser>> {
        let engine = BrowserEngine::launch(&self.config, &self.fingerprint).await?;
        Ok(Box::new(engine))
    }
}
