//! Session monitor.
//!
//! Decides from the current page whether the browsing context is still
//! authenticated. Fail-closed: a probe that cannot run counts as expired.

use crate::script;
use menuwatch_browser::ControlledBrowser;
use menuwatch_core::{LoginConfig, LoginState};
use serde::Deserialize;
use tracing::{debug, warn};

/// What the probe script saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginProbe {
    /// Document address as seen by the page
    pub url: String,
    /// An email input is present
    pub has_email_input: bool,
    /// Sign-in copy is visible
    pub has_sign_in_copy: bool,
}

/// Checks the login state of the monitored page.
pub struct SessionMonitor {
    config: LoginConfig,
    probe_script: String,
}

impl SessionMonitor {
    pub fn new(config: LoginConfig) -> Self {
        let probe_script = script::login_probe(&config);
        Self {
            config,
            probe_script,
        }
    }

    /// Inspect the page. Never fails: inspection errors yield `Expired`.
    pub async fn check_login(&self, browser: &dyn ControlledBrowser) -> LoginState {
        let url = match browser.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "could not read page address, treating session as expired");
                return LoginState::Expired;
            }
        };

        let probe = match browser.evaluate(&self.probe_script).await {
            Ok(value) => match serde_json::from_value::<LoginProbe>(value) {
                Ok(probe) => probe,
                Err(e) => {
                    warn!(error = %e, "login probe returned unexpected data");
                    return LoginState::Expired;
                }
            },
            Err(e) => {
                warn!(error = %e, "login probe failed, treating session as expired");
                return LoginState::Expired;
            }
        };

        let state = classify(&url, &probe, &self.config);
        debug!(?state, url = %url, "login check");
        state
    }
}

/// Pure classification of a probe result.
pub fn classify(url: &str, probe: &LoginProbe, config: &LoginConfig) -> LoginState {
    let url_marked = [url, probe.url.as_str()].iter().any(|address| {
        let address = address.to_lowercase();
        config
            .url_markers
            .iter()
            .filter(|m| !m.trim().is_empty())
            .any(|marker| address.contains(&marker.to_lowercase()))
    });

    if url_marked || probe.has_email_input || probe.has_sign_in_copy {
        LoginState::Expired
    } else {
        LoginState::Authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use menuwatch_browser::{BrowserError, Result as BrowserResult};
    use menuwatch_core::SessionCredentials;

    fn probe(url: &str) -> LoginProbe {
        LoginProbe {
            url: url.to_string(),
            ..LoginProbe::default()
        }
    }

    #[test]
    fn test_clean_page_is_authenticated() {
        let config = LoginConfig::default();
        let state = classify(
            "https://merchants.example.com/store/menu",
            &probe("https://merchants.example.com/store/menu"),
            &config,
        );
        assert_eq!(state, LoginState::Authenticated);
    }

    #[test]
    fn test_url_marker_is_expired() {
        let config = LoginConfig::default();
        let state = classify(
            "https://auth.example.com/LOGIN?next=/menu",
            &probe("https://auth.example.com/LOGIN?next=/menu"),
            &config,
        );
        assert_eq!(state, LoginState::Expired);
    }

    #[test]
    fn test_page_markers_are_expired() {
        let config = LoginConfig::default();
        let url = "https://merchants.example.com/store/menu";

        let email = LoginProbe {
            has_email_input: true,
            ..probe(url)
        };
        assert_eq!(classify(url, &email, &config), LoginState::Expired);

        let copy = LoginProbe {
            has_sign_in_copy: true,
            ..probe(url)
        };
        assert_eq!(classify(url, &copy, &config), LoginState::Expired);
    }

    struct BrokenBrowser;

    #[async_trait]
    impl ControlledBrowser for BrokenBrowser {
        async fn navigate(&self, _url: &str) -> BrowserResult<()> {
            Ok(())
        }
        async fn current_url(&self) -> BrowserResult<String> {
            Ok("https://merchants.example.com/store/menu".to_string())
        }
        async fn evaluate(&self, _script: &str) -> BrowserResult<serde_json::Value> {
            Err(BrowserError::JsEvalFailed("context destroyed".to_string()))
        }
        async fn screenshot(&self) -> BrowserResult<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn cookies(&self) -> BrowserResult<SessionCredentials> {
            Ok(SessionCredentials::new())
        }
        async fn set_cookies(&self, _credentials: &SessionCredentials) -> BrowserResult<()> {
            Ok(())
        }
        async fn reload(&self) -> BrowserResult<()> {
            Ok(())
        }
        async fn clear_cache(&self) -> BrowserResult<()> {
            Ok(())
        }
        async fn close(&mut self) -> BrowserResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_probe_failure_fails_closed() {
        let monitor = SessionMonitor::new(LoginConfig::default());
        assert_eq!(
            monitor.check_login(&BrokenBrowser).await,
            LoginState::Expired
        );
    }
}
