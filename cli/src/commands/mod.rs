//! CLI command implementations.

pub mod check;
pub mod config;
pub mod find;
pub mod list;
pub mod reserve;
pub mod resolve;
pub mod run;
pub mod who;

use anyhow::Result;
use portguard_core::{Config, ConfigStore, PortManager, PortManagerSettings};
use tracing::debug;

/// Load the user configuration, falling back to defaults when no file exists.
pub async fn load_config() -> Result<Config> {
    let store = ConfigStore::new()?;
    let config = store.load().await?;
    debug!(path = %store.path().display(), host = %config.host, max_attempts = config.max_attempts, "Loaded config");
    Ok(config)
}

/// A system port manager tuned by the user configuration.
pub fn manager(config: &Config) -> PortManager {
    PortManager::system().with_settings(PortManagerSettings::from(config))
}
