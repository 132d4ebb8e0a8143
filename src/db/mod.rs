use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::domain::{AccountPatch, UserRecord};

pub mod json_store;
pub mod migrator;
pub mod repositories;

pub use json_store::JsonUserStore;

/// Persistence contract shared by every backend.
///
/// Implementations own all serialization: callers never lock anything, and
/// [`UserStore::bind_hwid`] is the only way the login path writes.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Overwrites an existing record, matched by username.
    ///
    /// # Errors
    ///
    /// Fails if no record with that username exists.
    async fn save(&self, record: &UserRecord) -> Result<()>;

    /// Inserts a new record. Fails on a duplicate username.
    async fn create(&self, record: &UserRecord) -> Result<()>;

    /// Removing a missing username is not an error.
    async fn delete_by_username(&self, username: &str) -> Result<()>;

    /// All records in backend order.
    async fn list_all(&self) -> Result<Vec<UserRecord>>;

    async fn count(&self) -> Result<u64>;

    /// Applies `patch` to the named record without reading it first.
    ///
    /// Returns `false` if no such record exists.
    async fn update_account(&self, username: &str, patch: &AccountPatch) -> Result<bool>;

    /// Sets the record's `hwid` back to unbound; no other field is written.
    ///
    /// Returns `false` if no such record exists.
    async fn unbind_hwid(&self, username: &str) -> Result<bool>;

    /// Sets `hwid` only if the record is currently unbound.
    ///
    /// Atomic per record: of several concurrent callers at most one gets
    /// `true`. Returns `false` if the record is already bound or missing.
    /// Fails if `hwid` is itself an unbound value.
    async fn bind_hwid(&self, username: &str, hwid: &str) -> Result<bool>;
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl UserStore for Store {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.user_repo().get_by_username(username).await
    }

    async fn save(&self, record: &UserRecord) -> Result<()> {
        self.user_repo().update(record).await
    }

    async fn create(&self, record: &UserRecord) -> Result<()> {
        self.user_repo().create(record).await
    }

    async fn delete_by_username(&self, username: &str) -> Result<()> {
        self.user_repo().delete_by_username(username).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<UserRecord>> {
        self.user_repo().list_all().await
    }

    async fn count(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    async fn update_account(&self, username: &str, patch: &AccountPatch) -> Result<bool> {
        self.user_repo().update_account(username, patch).await
    }

    async fn unbind_hwid(&self, username: &str) -> Result<bool> {
        self.user_repo().unbind_hwid(username).await
    }

    async fn bind_hwid(&self, username: &str, hwid: &str) -> Result<bool> {
        self.user_repo().bind_hwid(username, hwid).await
    }
}

/// Opens the backend selected in `[storage]`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn UserStore>> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = Store::with_pool_options(
                &config.database_url,
                config.max_connections,
                config.min_connections,
            )
            .await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Json => {
            let store = JsonUserStore::open(&config.json_path).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .expect("in-memory store")
    }

    #[tokio::test]
    async fn create_then_find_roundtrips_fields() {
        let store = memory_store().await;
        let record = UserRecord::new("alice", "pw", false);
        store.create(&record).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, record);
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();

        assert!(
            store
                .create(&UserRecord::new("alice", "other", true))
                .await
                .is_err()
        );
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn bind_hwid_claims_unbound_slot_once() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();

        assert!(store.bind_hwid("alice", "DEV-1").await.unwrap());
        assert!(!store.bind_hwid("alice", "DEV-2").await.unwrap());

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.hwid, "DEV-1");
    }

    #[tokio::test]
    async fn bind_hwid_treats_empty_as_unbound() {
        let store = memory_store().await;
        let mut record = UserRecord::new("bob", "pw", false);
        record.hwid = String::new();
        store.create(&record).await.unwrap();

        assert!(store.bind_hwid("bob", "DEV-9").await.unwrap());
        assert!(!store.bind_hwid("missing", "DEV-9").await.unwrap());
    }

    #[tokio::test]
    async fn bind_hwid_refuses_the_unbound_sentinel() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();

        assert!(store.bind_hwid("alice", "0").await.is_err());
        assert!(store.bind_hwid("alice", " ").await.is_err());
        assert!(store.bind_hwid("alice", "DEV-1").await.unwrap());
    }

    #[tokio::test]
    async fn update_account_leaves_hwid_alone_unless_given() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();
        store.bind_hwid("alice", "DEV-1").await.unwrap();

        let mut patch = AccountPatch {
            password: "pw2".to_string(),
            admin: true,
            hwid: None,
        };
        assert!(store.update_account("alice", &patch).await.unwrap());
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hwid, "DEV-1");
        assert_eq!(alice.password, "pw2");
        assert!(alice.admin);

        patch.hwid = Some("DEV-2".to_string());
        assert!(store.update_account("alice", &patch).await.unwrap());
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.hwid, "DEV-2");

        assert!(!store.update_account("ghost", &patch).await.unwrap());
    }

    #[tokio::test]
    async fn unbind_hwid_only_touches_the_slot() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", true))
            .await
            .unwrap();
        store.bind_hwid("alice", "DEV-1").await.unwrap();

        assert!(store.unbind_hwid("alice").await.unwrap());
        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice, UserRecord::new("alice", "pw", true));

        assert!(!store.unbind_hwid("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn save_overwrites_and_requires_existing_row() {
        let store = memory_store().await;
        store
            .create(&UserRecord::new("alice", "pw", false))
            .await
            .unwrap();

        let updated = UserRecord {
            username: "alice".to_string(),
            password: "new".to_string(),
            hwid: "DEV-3".to_string(),
            admin: true,
        };
        store.save(&updated).await.unwrap();
        assert_eq!(
            store.find_by_username("alice").await.unwrap().unwrap(),
            updated
        );

        assert!(
            store
                .save(&UserRecord::new("ghost", "pw", false))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_delete_is_idempotent() {
        let store = memory_store().await;
        for name in ["carol", "alice", "bob"] {
            store
                .create(&UserRecord::new(name, "pw", false))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["carol", "alice", "bob"]);

        store.delete_by_username("alice").await.unwrap();
        store.delete_by_username("alice").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
