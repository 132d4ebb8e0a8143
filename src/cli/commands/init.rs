//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with default settings.");
        println!("Change [bootstrap].admin_password before first start.");
    } else {
        println!("config.toml already exists; leaving it untouched.");
    }
    Ok(())
}
