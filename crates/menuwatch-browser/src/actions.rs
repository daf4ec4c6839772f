use crate::error::{BrowserError, Result};
use menuwatch_core::SessionCredentials;

/// Capability object over a single authenticated browsing context.
///
/// All calls are serialized by the scrape loop; implementations need not
/// support concurrent use.
#[async_trait::async_trait]
pub trait ControlledBrowser: Send + Sync {
    /// Navigate to a URL and wait for the load to settle
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Address of the current document
    async fn current_url(&self) -> Result<String>;

    /// Evaluate a script in page context and return its JSON result
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Capture a PNG of the current page
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Read the session tokens currently held by the browser
    async fn cookies(&self) -> Result<SessionCredentials>;

    /// Install session tokens
    async fn set_cookies(&self, credentials: &SessionCredentials) -> Result<()>;

    /// Reload the current page without discarding the session
    async fn reload(&self) -> Result<()>;

    /// Drop the browser's HTTP cache
    async fn clear_cache(&self) -> Result<()>;

    /// Tear down the browser process
    async fn close(&mut self) -> Result<()>;
}

/// Produces fresh browser handles; used at startup and on hard restart.
#[async_trait::async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a new browser and open a blank page
    async fn launch(&self) -> Result<Box<dyn ControlledBrowser>>;
}

/// Helper to extract domain from URL
pub fn extract_domain(url: &str) -> Result<String> {
    let url = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {}", e)))?;

    url.host_str()
        .ok_or_else(|| BrowserError::NavigationError("No host in URL".to_string()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://merchants.example.com/store/menu").unwrap(),
            "merchants.example.com"
        );
        assert_eq!(
            extract_domain("http://localhost:8080/login").unwrap(),
            "localhost"
        );
    }

    #[test]
    fn test_extract_domain_invalid() {
        assert!(extract_domain("not-a-url").is_err());
    }
}
