//! Launcher configuration.
//!
//! Holds the auth server location, request timeout and the last username
//! used to log in. Stored at `~/.config/launchpass/config.json`; the account
//! store defaults to `<data dir>/launchpass/accounts.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::provider::YggdrasilClient;

/// Application name used for config/data directory paths
const APP_NAME: &str = "launchpass";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Account store file name
const STORE_FILE: &str = "accounts.json";

/// Environment variable overriding the auth server URL
pub const AUTH_URL_ENV: &str = "LAUNCHPASS_AUTH_URL";

const DEFAULT_AUTH_SERVER_URL: &str = "https://authserver.mojang.com";

/// 30s allows for slow auth servers while failing fast enough for good UX.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_server_url: String,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_server_url: DEFAULT_AUTH_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_username: None,
            store_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(AUTH_URL_ENV) {
            if !url.trim().is_empty() {
                self.auth_server_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(STORE_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the HTTP identity provider for the configured auth server
    pub fn provider(&self) -> Result<YggdrasilClient> {
        YggdrasilClient::with_timeout(self.auth_server_url.as_str(), self.request_timeout())
            .context("Failed to build auth server client")
    }
}
