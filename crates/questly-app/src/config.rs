//! Application configuration.
//!
//! Where the document lives, how long mentor calls may take and what gets
//! logged. Player-facing settings live in the document, not here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use questly_store::STORAGE_KEY;

/// Configuration file name.
const CONFIG_FILE: &str = "questly.toml";

/// Per-application subdirectory of the platform config and data dirs.
const APP_DIR_NAME: &str = "questly";

/// Data directory used when the platform has none.
const FALLBACK_DATA_DIR: &str = "questly-data";

/// Shortest allowed mentor timeout.
const MIN_MENTOR_TIMEOUT_MS: u64 = 5_000;

/// Longest allowed mentor timeout.
const MAX_MENTOR_TIMEOUT_MS: u64 = 30_000;

/// Application configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the document.
    pub data_dir: PathBuf,
    /// Storage key; the document is `<data_dir>/<storage_key>.json`.
    pub storage_key: String,
    /// How long a mentor call may take before the canned answer is used.
    pub mentor_timeout_ms: u64,
    /// Default log directive (`RUST_LOG` still applies on top).
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: STORAGE_KEY.to_string(),
            mentor_timeout_ms: MIN_MENTOR_TIMEOUT_MS,
            log_filter: "questly=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut contents = String::new();
        match fs::File::open(path) {
            Ok(mut file) => {
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                return Self::default();
            },
        }

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from(CONFIG_FILE),
            |dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE),
        )
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.mentor_timeout_ms = self
            .mentor_timeout_ms
            .clamp(MIN_MENTOR_TIMEOUT_MS, MAX_MENTOR_TIMEOUT_MS);
        if self.storage_key.trim().is_empty() {
            self.storage_key = STORAGE_KEY.to_string();
        }
        if self.log_filter.trim().is_empty() {
            self.log_filter = Self::default().log_filter;
        }
    }

    /// Mentor call timeout.
    #[must_use]
    pub fn mentor_timeout(&self) -> Duration {
        Duration::from_millis(self.mentor_timeout_ms)
    }
}

/// Platform data directory, falling back to the working directory.
fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(FALLBACK_DATA_DIR),
        |dir| dir.join(APP_DIR_NAME),
    )
}
