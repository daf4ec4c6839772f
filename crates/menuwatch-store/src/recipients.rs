//! Alert recipient persistence.
//!
//! The list is re-read on every call so edits made through the management
//! operations reach the next alert without a restart.

use crate::blob::{read_json, write_json};
use crate::error::{Result, StoreError};
use menuwatch_core::Recipient;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::info;

/// File name used inside the data directory.
pub const RECIPIENTS_FILE: &str = "recipients.json";

/// Ordered list of alert recipients on disk.
#[derive(Debug)]
pub struct RecipientStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecipientStore {
    /// Store backed by `<data_dir>/recipients.json`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(RECIPIENTS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    /// All recipients in insertion order.
    pub async fn list(&self) -> Result<Vec<Recipient>> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Recipients that should receive the next alert.
    pub async fn active(&self) -> Result<Vec<Recipient>> {
        let all = self.list().await?;
        Ok(all.into_iter().filter(Recipient::receives_alerts).collect())
    }

    /// Append a new active recipient and return it.
    pub async fn add(&self, name: &str, chat_id: &str) -> Result<Recipient> {
        if chat_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("chat id must not be empty".to_string()));
        }
        let _guard = self.write_lock.lock().await;
        let mut all = self.list().await?;
        let recipient = Recipient::new(name.trim(), chat_id.trim());
        all.push(recipient.clone());
        write_json(&self.path, &all).await?;
        info!(id = %recipient.id, name = %recipient.name, "added alert recipient");
        Ok(recipient)
    }

    /// Remove a recipient by id.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.list().await?;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Err(StoreError::NotFound(format!("recipient {id}")));
        }
        write_json(&self.path, &all).await?;
        info!(id, "removed alert recipient");
        Ok(())
    }

    /// Enable or disable delivery to a recipient.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<Recipient> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.list().await?;
        let recipient = all
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("recipient {id}")))?;
        recipient.active = active;
        let updated = recipient.clone();
        write_json(&self.path, &all).await?;
        info!(id, active, "toggled alert recipient");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_store() {
        let tmp = TempDir::new().unwrap();
        let store = RecipientStore::in_dir(tmp.path());
        assert!(store.list().await.unwrap().is_empty());
        assert!(store.active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let store = RecipientStore::in_dir(tmp.path());
        store.add("Alice", "111").await.unwrap();
        store.add("Bob", "222").await.unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_chat_id() {
        let tmp = TempDir::new().unwrap();
        let store = RecipientStore::in_dir(tmp.path());
        assert!(matches!(
            store.add("Nobody", "   ").await,
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_and_remove() {
        let tmp = TempDir::new().unwrap();
        let store = RecipientStore::in_dir(tmp.path());
        let alice = store.add("Alice", "111").await.unwrap();
        let bob = store.add("Bob", "222").await.unwrap();

        let updated = store.set_active(&alice.id, false).await.unwrap();
        assert!(!updated.active);
        let active = store.active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, bob.id);

        store.remove(&bob.id).await.unwrap();
        assert!(store.active().await.unwrap().is_empty());
        assert_eq!(store.list().await.unwrap().len(), 1);

        assert!(matches!(
            store.remove(&bob.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_active("missing", true).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
