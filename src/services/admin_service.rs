//! Domain service for account administration.
//!
//! There are no admin sessions: every operation takes the caller's admin
//! credentials and re-runs the admin gate before touching the store.

use serde::Serialize;
use thiserror::Error;

use crate::domain::UserRecord;

/// Errors specific to admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Invalid admin credentials")]
    Unauthorized,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("The main admin account cannot be deleted")]
    CannotDeleteMainAdmin,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AdminError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Admin username/password pair sent with every admin request.
#[derive(Debug, Clone, Default)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Proof that the admin gate passed for one call.
///
/// Only the gate can construct it and it is not `Clone`, so it cannot outlive
/// the request that earned it in any useful way.
#[derive(Debug)]
pub struct AdminToken {
    username: String,
}

impl AdminToken {
    pub(crate) fn new(username: String) -> Self {
        Self { username }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Add-or-update request.
#[derive(Debug, Clone, Default)]
pub struct UserUpsert {
    pub username: String,
    pub password: String,

    /// `None` or empty keeps an existing binding (or leaves a new account unbound).
    pub hwid: Option<String>,

    pub admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertResult {
    Created,
    Updated,
}

/// Domain service trait for admin operations.
#[async_trait::async_trait]
pub trait AdminService: Send + Sync {
    /// Runs the admin gate on its own.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Unauthorized`] unless the account exists, the
    /// password matches and the account is an admin.
    async fn authorize(&self, credentials: &AdminCredentials) -> Result<AdminToken, AdminError>;

    /// Lists every account in store order, passwords included.
    async fn list_users(&self, credentials: &AdminCredentials)
    -> Result<Vec<UserRecord>, AdminError>;

    /// Creates an account or overwrites password and admin flag of an existing one.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::InvalidData`] if username or password is empty.
    async fn upsert_user(
        &self,
        credentials: &AdminCredentials,
        user: UserUpsert,
    ) -> Result<UpsertResult, AdminError>;

    /// Deletes an account. Deleting a missing account succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::CannotDeleteMainAdmin`] for `admin`, whoever asks.
    async fn delete_user(
        &self,
        credentials: &AdminCredentials,
        username: &str,
    ) -> Result<(), AdminError>;

    /// Unbinds an account so its next login binds a new device.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotFound`] if the account does not exist.
    async fn reset_hwid(
        &self,
        credentials: &AdminCredentials,
        username: &str,
    ) -> Result<(), AdminError>;
}
