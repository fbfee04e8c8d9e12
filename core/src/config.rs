//! Configuration management for default host, scan width and service ports.
//!
//! Stores configuration in JSON format at `~/.portguard/config.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Host used when none is given.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Number of candidate ports scanned before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u16 = 100;

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Host to probe and bind when none is given.
    #[serde(default = "default_host")]
    pub host: String,

    /// Candidates scanned by port searches.
    #[serde(default = "default_max_attempts", rename = "maxAttempts")]
    pub max_attempts: u16,

    /// Preferred port per service name.
    #[serde(default)]
    pub services: BTreeMap<String, u16>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_max_attempts() -> u16 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            max_attempts: default_max_attempts(),
            services: BTreeMap::new(),
        }
    }
}

/// Configuration store.
///
/// Handles reading and writing configuration to `~/.portguard/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portguard/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portguard").join("config.json"),
        })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }

    /// Preferred port for a service, if one is configured.
    pub async fn get_service_port(&self, service: &str) -> Result<Option<u16>> {
        let config = self.load().await?;
        Ok(config.services.get(service).copied())
    }

    /// Set the preferred port for a service.
    pub async fn set_service_port(&self, service: &str, port: u16) -> Result<()> {
        if port == 0 {
            return Err(Error::Config("Service port must be in range 1-65535".to_string()));
        }
        let mut config = self.load().await?;
        config.services.insert(service.to_string(), port);
        self.save(&config).await
    }

    /// Forget the preferred port for a service.
    pub async fn remove_service_port(&self, service: &str) -> Result<()> {
        let mut config = self.load().await?;
        if config.services.remove(service).is_none() {
            return Err(Error::Config(format!("Service {} has no configured port", service)));
        }
        self.save(&config).await
    }

    /// Set the default host.
    pub async fn set_host(&self, host: &str) -> Result<()> {
        if host.trim().is_empty() {
            return Err(Error::Config("Host must not be empty".to_string()));
        }
        let mut config = self.load().await?;
        config.host = host.to_string();
        self.save(&config).await
    }

    /// Set how many candidate ports a search may try.
    pub async fn set_max_attempts(&self, max_attempts: u16) -> Result<()> {
        if max_attempts == 0 {
            return Err(Error::Config("maxAttempts must be at least 1".to_string()));
        }
        let mut config = self.load().await?;
        config.max_attempts = max_attempts;
        self.save(&config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portguard").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store().await;
        let config = store.load().await.unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.max_attempts, 100);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store().await;

        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.services.insert("api".to_string(), 8000);
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store().await;
        store.save(&Config::default()).await.unwrap();
        std::fs::write(store.path(), r#"{"maxAttempts": 20}"#).unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.max_attempts, 20);
        assert_eq!(loaded.host, DEFAULT_HOST);
        assert!(loaded.services.is_empty());
    }

    #[tokio::test]
    async fn test_service_ports() {
        let (store, _dir) = test_store().await;

        store.set_service_port("web", 5000).await.unwrap();
        store.set_service_port("api", 8000).await.unwrap();
        assert_eq!(store.get_service_port("web").await.unwrap(), Some(5000));

        store.remove_service_port("web").await.unwrap();
        assert_eq!(store.get_service_port("web").await.unwrap(), None);
        assert_eq!(store.get_service_port("api").await.unwrap(), Some(8000));

        assert!(store.remove_service_port("web").await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.set_max_attempts(0).await.is_err());
        assert!(store.set_host("").await.is_err());
        assert!(store.set_service_port("api", 0).await.is_err());

        store.set_max_attempts(25).await.unwrap();
        assert_eq!(store.load().await.unwrap().max_attempts, 25);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_config_error() {
        let (store, _dir) = test_store().await;
        store.save(&Config::default()).await.unwrap();
        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load().await, Err(Error::Config(_))));
    }
}
