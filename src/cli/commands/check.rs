//! Check command handler

use crate::config::{Config, StorageBackend};
use crate::db::open_store;

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;
    println!("Config OK");

    let location = match config.storage.backend {
        StorageBackend::Sqlite => config.storage.database_url.as_str(),
        StorageBackend::Json => config.storage.json_path.as_str(),
    };

    let store = open_store(&config.storage).await?;
    let users = store.count().await?;

    println!("Store OK: {:?} at {} ({} users)", config.storage.backend, location, users);
    if users == 0 {
        println!("The admin account will be created on first start.");
    }

    Ok(())
}
