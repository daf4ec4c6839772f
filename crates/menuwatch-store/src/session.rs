//! Session credential persistence.

use crate::blob::{read_json, write_json};
use crate::error::Result;
use menuwatch_core::SessionCredentials;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used inside the data directory.
pub const SESSION_FILE: &str = "session.json";

/// Persists the browser's session tokens so a restart keeps the login.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store backed by `<data_dir>/session.json`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::at(data_dir.join(SESSION_FILE))
    }

    /// Store backed by an explicit file.
    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last saved credentials; empty when nothing was saved yet.
    pub async fn load(&self) -> Result<SessionCredentials> {
        let creds: SessionCredentials = read_json(&self.path).await?.unwrap_or_default();
        debug!(count = creds.len(), path = %self.path.display(), "loaded session credentials");
        Ok(creds)
    }

    /// Overwrite the saved credentials.
    pub async fn save(&self, credentials: &SessionCredentials) -> Result<()> {
        write_json(&self.path, credentials).await?;
        debug!(count = credentials.len(), "saved session credentials");
        Ok(())
    }

    /// Forget the saved credentials.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use menuwatch_core::SessionCookie;
    use tempfile::TempDir;

    fn creds(value: &str) -> SessionCredentials {
        vec![SessionCookie {
            name: "sid".to_string(),
            value: value.to_string(),
            domain: ".example.com".to_string(),
            path: "/".to_string(),
            expires: Some(1_900_000_000.0),
            http_only: true,
            secure: true,
        }]
        .into()
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(tmp.path());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(&tmp.path().join("nested"));

        store.save(&creds("first")).await.unwrap();
        store.save(&creds("second")).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, creds("second"));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(tmp.path());
        tokio::fs::write(store.path(), b"{not json").await.unwrap();
        assert!(matches!(
            store.load().await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_clear() {
        let tmp = TempDir::new().unwrap();
        let store = SessionStore::in_dir(tmp.path());
        store.clear().await.unwrap();
        store.save(&creds("x")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
