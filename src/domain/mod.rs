//! Domain types for accounts and device binding.
//!
//! A [`UserRecord`] is the only persistent entity. Its `hwid` column encodes a
//! small state machine, modelled here as [`HwidBinding`] so the rest of the
//! crate never has to remember which sentinel strings mean "unbound".

use serde::{Deserialize, Serialize};

/// Stored `hwid` value of an account that has not been bound to a device yet.
pub const UNBOUND_HWID: &str = "0";

/// Username of the account created on first start; it can never be deleted.
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

/// A user account as persisted by every storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,

    /// Compared verbatim; see [`crate::services::credentials`].
    pub password: String,

    /// `"0"`, empty, or absent means unbound.
    #[serde(default = "unbound_hwid")]
    pub hwid: String,

    #[serde(default)]
    pub admin: bool,
}

fn unbound_hwid() -> String {
    UNBOUND_HWID.to_string()
}

impl UserRecord {
    /// A fresh record with no device bound.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, admin: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            hwid: unbound_hwid(),
            admin,
        }
    }

    #[must_use]
    pub fn binding(&self) -> HwidBinding<'_> {
        HwidBinding::from_stored(&self.hwid)
    }
}

/// Field-level edit of an existing account.
///
/// `hwid: None` leaves the stored binding untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPatch {
    pub password: String,
    pub admin: bool,
    pub hwid: Option<String>,
}

#[must_use]
pub fn is_bootstrap_admin(username: &str) -> bool {
    username == BOOTSTRAP_ADMIN_USERNAME
}

/// Whether a stored `hwid` value means "no device bound".
#[must_use]
pub fn is_unbound(stored: &str) -> bool {
    let trimmed = stored.trim();
    trimmed.is_empty() || trimmed == UNBOUND_HWID
}

/// Device-binding state of an account.
///
/// `Unbound --login(h)--> Bound(h)`, `Bound(h) --admin reset--> Unbound`.
/// Logins against `Bound(h)` never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwidBinding<'a> {
    Unbound,
    Bound(&'a str),
}

impl<'a> HwidBinding<'a> {
    #[must_use]
    pub fn from_stored(stored: &'a str) -> Self {
        if is_unbound(stored) {
            Self::Unbound
        } else {
            Self::Bound(stored)
        }
    }

    /// True only for a bound record whose device equals `hwid` exactly.
    #[must_use]
    pub fn matches(&self, hwid: &str) -> bool {
        match self {
            Self::Unbound => false,
            Self::Bound(bound) => *bound == hwid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_and_empty_hwid_are_unbound() {
        assert!(is_unbound("0"));
        assert!(is_unbound(""));
        assert!(is_unbound("   "));
        assert!(!is_unbound("DEV-1"));
        assert!(!is_unbound("00"));
    }

    #[test]
    fn binding_matches_exact_device_only() {
        let record = UserRecord {
            username: "alice".to_string(),
            password: "pw".to_string(),
            hwid: "DEV-1".to_string(),
            admin: false,
        };

        let binding = record.binding();
        assert!(matches!(binding, HwidBinding::Bound(_)));
        assert!(binding.matches("DEV-1"));
        assert!(!binding.matches("dev-1"));
        assert!(!binding.matches("DEV-2"));
    }

    #[test]
    fn unbound_never_matches() {
        let record = UserRecord::new("bob", "pw", false);
        assert_eq!(record.binding(), HwidBinding::Unbound);
        assert!(!record.binding().matches("0"));
    }

    #[test]
    fn missing_json_fields_default_to_unbound_member() {
        let record: UserRecord =
            serde_json::from_str(r#"{"username":"carol","password":"pw"}"#).unwrap();
        assert_eq!(record.hwid, UNBOUND_HWID);
        assert!(!record.admin);
    }

    #[test]
    fn bootstrap_admin_is_recognised_by_name() {
        assert!(is_bootstrap_admin("admin"));
        assert!(!is_bootstrap_admin("Admin"));
    }
}
