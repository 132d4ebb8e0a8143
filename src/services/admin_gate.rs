//! The admin authorization gate.

use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::db::UserStore;
use crate::services::admin_service::{AdminCredentials, AdminToken};
use crate::services::credentials::PasswordVerifier;

/// Checks an admin credential pair against the store.
///
/// Holds no state between calls; each [`AdminGate::authorize`] reads the
/// account afresh.
pub struct AdminGate {
    store: Arc<dyn UserStore>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl AdminGate {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        Self { store, verifier }
    }

    /// `Ok(None)` means "not authorized"; `Err` is a store failure.
    pub async fn authorize(&self, credentials: &AdminCredentials) -> Result<Option<AdminToken>> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Ok(None);
        }

        let Some(user) = self.store.find_by_username(&credentials.username).await? else {
            warn!(admin_user = %credentials.username, "Admin gate rejected: unknown account");
            return Ok(None);
        };

        if !self.verifier.verify(&user.password, &credentials.password) {
            warn!(admin_user = %credentials.username, "Admin gate rejected: wrong password");
            return Ok(None);
        }

        if !user.admin {
            warn!(admin_user = %credentials.username, "Admin gate rejected: not an admin");
            return Ok(None);
        }

        Ok(Some(AdminToken::new(user.username)))
    }
}
