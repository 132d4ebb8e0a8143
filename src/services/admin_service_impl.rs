//! Store-backed implementation of the `AdminService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::db::UserStore;
use crate::domain::{AccountPatch, UNBOUND_HWID, UserRecord, is_bootstrap_admin};
use crate::services::admin_gate::AdminGate;
use crate::services::admin_service::{
    AdminCredentials, AdminError, AdminService, AdminToken, UpsertResult, UserUpsert,
};
use crate::services::credentials::{PasswordVerifier, PlaintextVerifier};

pub struct StoreAdminService {
    store: Arc<dyn UserStore>,
    gate: AdminGate,
}

impl StoreAdminService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_verifier(store, Arc::new(PlaintextVerifier))
    }

    #[must_use]
    pub fn with_verifier(store: Arc<dyn UserStore>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        let gate = AdminGate::new(store.clone(), verifier);
        Self { store, gate }
    }

    fn require_username(username: &str) -> Result<(), AdminError> {
        if username.is_empty() {
            return Err(AdminError::InvalidData("username is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminService for StoreAdminService {
    async fn authorize(&self, credentials: &AdminCredentials) -> Result<AdminToken, AdminError> {
        self.gate
            .authorize(credentials)
            .await?
            .ok_or(AdminError::Unauthorized)
    }

    async fn list_users(
        &self,
        credentials: &AdminCredentials,
    ) -> Result<Vec<UserRecord>, AdminError> {
        self.authorize(credentials).await?;

        Ok(self.store.list_all().await?)
    }

    async fn upsert_user(
        &self,
        credentials: &AdminCredentials,
        user: UserUpsert,
    ) -> Result<UpsertResult, AdminError> {
        let token = self.authorize(credentials).await?;

        if user.username.is_empty() || user.password.is_empty() {
            return Err(AdminError::InvalidData(
                "username and password are required".to_string(),
            ));
        }

        let hwid = user.hwid.filter(|h| !h.is_empty());

        let patch = AccountPatch {
            password: user.password.clone(),
            admin: user.admin,
            hwid: hwid.clone(),
        };
        if self.store.update_account(&user.username, &patch).await? {
            info!(admin_user = %token.username(), username = %user.username, "User updated");
            return Ok(UpsertResult::Updated);
        }

        let record = UserRecord {
            username: user.username,
            password: user.password,
            hwid: hwid.unwrap_or_else(|| UNBOUND_HWID.to_string()),
            admin: user.admin,
        };
        self.store.create(&record).await?;

        info!(admin_user = %token.username(), username = %record.username, "User created");
        Ok(UpsertResult::Created)
    }

    async fn delete_user(
        &self,
        credentials: &AdminCredentials,
        username: &str,
    ) -> Result<(), AdminError> {
        // Decided before the gate so the answer is the same for every caller.
        if is_bootstrap_admin(username) {
            return Err(AdminError::CannotDeleteMainAdmin);
        }

        let token = self.authorize(credentials).await?;
        Self::require_username(username)?;

        self.store.delete_by_username(username).await?;

        info!(admin_user = %token.username(), username = %username, "User deleted");
        Ok(())
    }

    async fn reset_hwid(
        &self,
        credentials: &AdminCredentials,
        username: &str,
    ) -> Result<(), AdminError> {
        let token = self.authorize(credentials).await?;
        Self::require_username(username)?;

        if !self.store.unbind_hwid(username).await? {
            return Err(AdminError::NotFound(username.to_string()));
        }

        info!(admin_user = %token.username(), username = %username, "HWID reset");
        Ok(())
    }
}
