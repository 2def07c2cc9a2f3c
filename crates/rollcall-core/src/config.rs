//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the server base URL, endpoint paths, the token store
//! backend, and the last used user id.
//!
//! Configuration is stored at `~/.config/rollcall/config.json`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileStore, KeyValueStore, KeyringStore, MemoryStore, TokenStore};

/// Application name used for config/cache directory paths and the keyring service
pub const APP_NAME: &str = "rollcall";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "ROLLCALL_BASE_URL";

/// Environment variable overriding `store`
pub const ENV_STORE: &str = "ROLLCALL_STORE";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::File => "file",
            StoreBackend::Keyring => "keyring",
            StoreBackend::Memory => "memory",
        })
    }
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StoreBackend::File),
            "keyring" => Ok(StoreBackend::Keyring),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown store backend '{}' (expected file, keyring or memory)",
                other
            )),
        }
    }
}

/// Server-side paths, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    /// Where users are sent after their credential is rejected
    pub login_page: String,
    /// Prefix of the `/<kind>/query` endpoints
    pub query_prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/login".to_string(),
            login_page: "/login".to_string(),
            query_prefix: "/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_user_id: Option<String>,
    pub store: StoreBackend,
    pub endpoints: Endpoints,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `ROLLCALL_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = Some(url.trim().to_string());
        }
        if let Some(store) = lookup(ENV_STORE).filter(|v| !v.trim().is_empty()) {
            self.store = store
                .parse()
                .with_context(|| format!("Invalid {} value", ENV_STORE))?;
        }
        Ok(())
    }

    /// Open the configured token store backend
    pub fn open_store(&self) -> Result<TokenStore> {
        let backend: Arc<dyn KeyValueStore> = match self.store {
            StoreBackend::File => Arc::new(FileStore::new(self.cache_dir()?)),
            StoreBackend::Keyring => Arc::new(KeyringStore::new(APP_NAME)),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(TokenStore::new(backend))
    }
}
