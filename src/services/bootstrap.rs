//! First-run seeding of the main admin account.

use anyhow::{Context, Result};
use tracing::info;

use crate::db::UserStore;
use crate::domain::{BOOTSTRAP_ADMIN_USERNAME, UserRecord};

/// Creates the unbound `admin` account if the store holds no users at all.
///
/// Returns whether an account was created. Must run before requests are
/// served.
pub async fn ensure_default_admin(store: &dyn UserStore, password: &str) -> Result<bool> {
    let count = store.count().await.context("Failed to count users")?;
    if count > 0 {
        return Ok(false);
    }

    store
        .create(&UserRecord::new(BOOTSTRAP_ADMIN_USERNAME, password, true))
        .await
        .context("Failed to create default admin")?;

    info!("Default admin created: {BOOTSTRAP_ADMIN_USERNAME}");
    Ok(true)
}
