//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: API
//! location, session storage backend and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/smokesignal/config.json`.
//! `SMOKESIGNAL_API_URL` and `SMOKESIGNAL_STORAGE` override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::transport::REQUEST_TIMEOUT_SECS;
use crate::auth::StorageBackend;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "smokesignal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

pub const API_URL_ENV: &str = "SMOKESIGNAL_API_URL";
pub const STORAGE_ENV: &str = "SMOKESIGNAL_STORAGE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub login_path: String,
    pub storage: StorageBackend,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            storage: StorageBackend::default(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            last_email: None,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(storage) = lookup(STORAGE_ENV) {
            match storage.parse() {
                Ok(backend) => self.storage = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", STORAGE_ENV),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// `/health` lives at the server root, outside the versioned API prefix
    pub fn health_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        let root = match base.find("/api/") {
            Some(idx) => &base[..idx],
            None => base.strip_suffix("/api").unwrap_or(base),
        };
        format!("{}/health", root)
    }
}
