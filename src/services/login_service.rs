//! Domain service for device-bound logins.
//!
//! A login is checked in a fixed order: input presence, account lookup,
//! password, then the HWID binding. Unknown users and wrong passwords are
//! reported identically.

use thiserror::Error;

/// Reasons a login attempt is refused.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username and password are required")]
    MissingFields,

    #[error("HWID is required")]
    HwidRequired,

    /// Unknown username or wrong password; the two are never distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("This account is already bound to another device")]
    HwidMismatch,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for LoginError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// First use: the account was unbound and is now bound to the supplied HWID.
    Bound { admin: bool },

    /// The account was already bound to the supplied HWID.
    Accepted { admin: bool },
}

impl LoginOutcome {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        match self {
            Self::Bound { admin } | Self::Accepted { admin } => *admin,
        }
    }
}

/// Domain service trait for logins.
#[async_trait::async_trait]
pub trait LoginService: Send + Sync {
    /// Evaluates a login and binds the account on first use.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Internal`] if the store fails, including when the
    /// first-use binding cannot be persisted. Every other variant is a refusal
    /// that left the store untouched.
    async fn attempt_login(
        &self,
        username: &str,
        password: &str,
        hwid: &str,
    ) -> Result<LoginOutcome, LoginError>;
}
