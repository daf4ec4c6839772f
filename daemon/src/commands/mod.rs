pub mod monitor;
pub mod recipients;

use anyhow::Context;
use menuwatch_core::AppConfig;
use std::path::Path;

/// Load the config file (explicit or default) and apply env overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => AppConfig::load_with_env().context("failed to load config"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[general]\ntarget_url = \"https://merchants.example.com/menu\"\n\n[scraping]\nmaterialize_every = 3\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.scraping.materialize_every, 3);
        assert_eq!(config.scraping.error_threshold, 5);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
