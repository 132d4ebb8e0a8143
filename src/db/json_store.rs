//! Flat-file user store.
//!
//! The whole user list lives in one pretty-printed JSON document of the form
//! `{ "users": [ ... ] }`. Every operation re-reads the file under a single
//! async mutex, so edits made to the file between requests are picked up and
//! concurrent requests in this process are serialized.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::UserStore;
use crate::domain::{AccountPatch, UNBOUND_HWID, UserRecord, is_unbound};

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserRecord>,
}

pub struct JsonUserStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonUserStore {
    /// Opens (but does not create) the file at `path`.
    ///
    /// Parent directories are created so the first write can succeed. The
    /// file is parsed once here so a corrupt document fails at startup.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        let users = store.load().await?;
        info!(
            "Using JSON user store at {} ({} users)",
            store.path.display(),
            users.users.len()
        );

        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<UsersFile> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UsersFile::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        if raw.trim().is_empty() {
            return Ok(UsersFile::default());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// Writes through a sibling temp file so readers never see a torn document.
    async fn persist(&self, data: &UsersFile) -> Result<()> {
        let content = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Persisted {} users to {}", data.users.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;
        Ok(data.users.into_iter().find(|u| u.username == username))
    }

    async fn save(&self, record: &UserRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let existing = data
            .users
            .iter_mut()
            .find(|u| u.username == record.username)
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", record.username))?;
        *existing = record.clone();

        self.persist(&data).await
    }

    async fn create(&self, record: &UserRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        if data.users.iter().any(|u| u.username == record.username) {
            anyhow::bail!("User already exists: {}", record.username);
        }
        data.users.push(record.clone());

        self.persist(&data).await
    }

    async fn delete_by_username(&self, username: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let before = data.users.len();
        data.users.retain(|u| u.username != username);
        if data.users.len() == before {
            return Ok(());
        }

        self.persist(&data).await
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.users)
    }

    async fn count(&self) -> Result<u64> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.users.len() as u64)
    }

    async fn update_account(&self, username: &str, patch: &AccountPatch) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let Some(user) = data.users.iter_mut().find(|u| u.username == username) else {
            return Ok(false);
        };
        user.password.clone_from(&patch.password);
        user.admin = patch.admin;
        if let Some(hwid) = &patch.hwid {
            user.hwid.clone_from(hwid);
        }

        self.persist(&data).await?;
        Ok(true)
    }

    async fn unbind_hwid(&self, username: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let Some(user) = data.users.iter_mut().find(|u| u.username == username) else {
            return Ok(false);
        };
        user.hwid = UNBOUND_HWID.to_string();

        self.persist(&data).await?;
        Ok(true)
    }

    async fn bind_hwid(&self, username: &str, hwid: &str) -> Result<bool> {
        anyhow::ensure!(!is_unbound(hwid), "Refusing to bind an unbound hwid value");

        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;

        let Some(user) = data.users.iter_mut().find(|u| u.username == username) else {
            return Ok(false);
        };
        if !is_unbound(&user.hwid) {
            return Ok(false);
        }
        user.hwid = hwid.to_string();

        self.persist(&data).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("glom-auth-json-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let store = JsonUserStore::open(temp_path("users.json")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn writes_are_visible_to_a_fresh_handle() {
        let path = temp_path("users.json");
        let store = JsonUserStore::open(&path).await.unwrap();
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();
        assert!(store.bind_hwid("alice", "DEV-1").await.unwrap());

        let reopened = JsonUserStore::open(&path).await.unwrap();
        let alice = reopened.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hwid, "DEV-1");
    }

    #[tokio::test]
    async fn corrupt_file_fails_instead_of_reading_as_empty() {
        let path = temp_path("users.json");
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "{ not json").await.unwrap();

        assert!(JsonUserStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn empty_hwid_field_counts_as_unbound() {
        let path = temp_path("users.json");
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(
            &path,
            r#"{"users":[{"username":"bob","password":"pw","hwid":""}]}"#,
        )
        .await
        .unwrap();

        let store = JsonUserStore::open(&path).await.unwrap();
        assert!(store.bind_hwid("bob", "DEV-7").await.unwrap());
        assert!(!store.bind_hwid("bob", "DEV-8").await.unwrap());
    }

    #[tokio::test]
    async fn field_updates_keep_the_other_fields() {
        let store = JsonUserStore::open(temp_path("users.json")).await.unwrap();
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();
        assert!(store.bind_hwid("alice", "DEV-1").await.unwrap());
        assert!(store.bind_hwid("alice", "0").await.is_err());

        let patch = AccountPatch {
            password: "pw2".to_string(),
            admin: true,
            hwid: None,
        };
        assert!(store.update_account("alice", &patch).await.unwrap());
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hwid, "DEV-1");
        assert_eq!(alice.password, "pw2");

        assert!(store.unbind_hwid("alice").await.unwrap());
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hwid, UNBOUND_HWID);
        assert_eq!(alice.password, "pw2");
        assert!(alice.admin);

        assert!(!store.update_account("ghost", &patch).await.unwrap());
        assert!(!store.unbind_hwid("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_duplicates_and_delete_is_idempotent() {
        let store = JsonUserStore::open(temp_path("users.json")).await.unwrap();
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();
        assert!(
            store
                .create(&UserRecord::new("alice", "pw2", false))
                .await
                .is_err()
        );

        store.delete_by_username("alice").await.unwrap();
        store.delete_by_username("alice").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
