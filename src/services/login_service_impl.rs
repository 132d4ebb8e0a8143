//! Store-backed implementation of the `LoginService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::UserStore;
use crate::domain::{HwidBinding, is_unbound};
use crate::services::credentials::{PasswordVerifier, PlaintextVerifier};
use crate::services::login_service::{LoginError, LoginOutcome, LoginService};

pub struct StoreLoginService {
    store: Arc<dyn UserStore>,
    verifier: Arc<dyn PasswordVerifier>,
}

impl StoreLoginService {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_verifier(store, Arc::new(PlaintextVerifier))
    }

    #[must_use]
    pub fn with_verifier(store: Arc<dyn UserStore>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Runs after a conditional bind lost: someone else changed the slot
    /// between our read and our write, so compare against what is stored now.
    async fn reevaluate_after_lost_bind(
        &self,
        username: &str,
        hwid: &str,
    ) -> Result<LoginOutcome, LoginError> {
        let Some(current) = self.store.find_by_username(username).await? else {
            return Err(LoginError::InvalidCredentials);
        };

        match current.binding() {
            binding if binding.matches(hwid) => Ok(LoginOutcome::Accepted {
                admin: current.admin,
            }),
            HwidBinding::Bound(_) => {
                warn!(username = %username, "Login rejected: hwid mismatch after concurrent bind");
                Err(LoginError::HwidMismatch)
            }
            HwidBinding::Unbound => Err(LoginError::Internal(format!(
                "hwid binding for {username} was not persisted"
            ))),
        }
    }
}

fn validate_input(username: &str, password: &str, hwid: &str) -> Result<(), LoginError> {
    if username.is_empty() || password.is_empty() {
        return Err(LoginError::MissingFields);
    }
    // The unbound sentinel can never be claimed as a device.
    if is_unbound(hwid) {
        return Err(LoginError::HwidRequired);
    }
    Ok(())
}

#[async_trait]
impl LoginService for StoreLoginService {
    async fn attempt_login(
        &self,
        username: &str,
        password: &str,
        hwid: &str,
    ) -> Result<LoginOutcome, LoginError> {
        validate_input(username, password, hwid)?;

        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(username = %username, "Login rejected: invalid credentials");
            return Err(LoginError::InvalidCredentials);
        };

        if !self.verifier.verify(&user.password, password) {
            warn!(username = %username, "Login rejected: invalid credentials");
            return Err(LoginError::InvalidCredentials);
        }

        match user.binding() {
            HwidBinding::Unbound => {
                if self.store.bind_hwid(username, hwid).await? {
                    info!(username = %username, "Account bound to device on first login");
                    Ok(LoginOutcome::Bound { admin: user.admin })
                } else {
                    self.reevaluate_after_lost_bind(username, hwid).await
                }
            }
            binding if binding.matches(hwid) => Ok(LoginOutcome::Accepted { admin: user.admin }),
            HwidBinding::Bound(_) => {
                warn!(username = %username, "Login rejected: hwid mismatch");
                Err(LoginError::HwidMismatch)
            }
        }
    }
}
