//! Application configuration management.
//!
//! Handles loading and saving application-wide settings: where the local
//! cache lives, which proxy to fetch videos from, and the optional remote
//! store used for cross-device sync.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory where the local cache keeps its per-key JSON files.
    pub state_directory: PathBuf,
    /// Base URL of the video proxy (serves the `/api` surface).
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,
    /// Base URL of the remote sync store, if any.
    #[serde(default)]
    pub remote_store_url: Option<String>,
    /// API key sent to the remote sync store.
    #[serde(default)]
    pub remote_store_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_directory: default_state_directory(),
            provider_base_url: default_provider_base_url(),
            remote_store_url: None,
            remote_store_key: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or create defaults if
    /// not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(config_path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", config_path.display());
        debug!("State directory: {}", config.state_directory.display());

        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Whether a remote sync store is configured.
    #[must_use]
    pub const fn remote_sync_enabled(&self) -> bool {
        self.remote_store_url.is_some()
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the default state directory for the local cache.
#[must_use]
pub fn default_state_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playtube")
        .join("state")
}

fn default_provider_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("playtube")
        .join("config.json")
}
