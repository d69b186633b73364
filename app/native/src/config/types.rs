//! Configuration types for Dailywall.
//!
//! This module provides the configuration types and loading functionality.
//! The configuration file supports JSONC format (JSON with comments).
//! Both single-line (`//`) and multi-line (`/* */`) comments are allowed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constants::APP_NAME;
use crate::model::DEFAULT_ZOOM_FACTOR;

/// Remote feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    /// Metadata endpoint queried with `format=xml&idx=&n=&mkt=`.
    /// Default: "https://www.bing.com/HPImageArchive.aspx"
    pub endpoint: String,

    /// Host prepended to each record's `urlBase`.
    /// Default: "https://www.bing.com"
    pub host: String,

    /// Market code sent as `mkt`.
    /// Default: "en-US"
    pub market: String,

    /// Suffix appended to `urlBase` for the full-resolution image.
    /// Default: "_UHD.jpg"
    pub image_suffix: String,

    /// Suffix appended to `urlBase` for the thumbnail.
    /// Default: "_320x240.jpg"
    pub thumbnail_suffix: String,

    /// Request timeout in seconds.
    /// Default: 30
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.bing.com/HPImageArchive.aspx".to_string(),
            host: "https://www.bing.com".to_string(),
            market: "en-US".to_string(),
            image_suffix: "_UHD.jpg".to_string(),
            thumbnail_suffix: "_320x240.jpg".to_string(),
            timeout_secs: 30,
        }
    }
}

impl FeedConfig {
    /// Request timeout as a `Duration` (at least one second).
    #[must_use]
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs.max(1)) }
}

/// Polling, retention and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Seconds between two feed checks.
    /// Default: 3600
    pub check_interval: u64,

    /// Seconds to wait after a failed cycle before retrying.
    /// Doubles on consecutive failures, capped at `checkInterval`.
    /// Default: 60
    pub retry_interval: u64,

    /// Number of days of remote history kept cached locally.
    /// Default: 7
    pub history_days: usize,

    /// Slots below this index also keep the full image; the rest keep
    /// thumbnails only.
    /// Default: 3
    pub max_full_image_slots: usize,

    /// Attempts per file download inside one cache fill.
    /// Default: 3
    pub download_attempts: u32,

    /// Milliseconds to wait for the background loop to exit on shutdown.
    /// Default: 1000
    pub shutdown_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            check_interval: 3600,
            retry_interval: 60,
            history_days: 7,
            max_full_image_slots: 3,
            download_attempts: 3,
            shutdown_timeout_ms: 1000,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn check_interval(&self) -> Duration { Duration::from_secs(self.check_interval.max(1)) }

    #[must_use]
    pub fn retry_interval(&self) -> Duration { Duration::from_secs(self.retry_interval.max(1)) }

    #[must_use]
    pub fn history_days(&self) -> usize { self.history_days.max(1) }

    #[must_use]
    pub fn download_attempts(&self) -> u32 { self.download_attempts.max(1) }

    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Where state, the ledger and cached images live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Data directory. Empty means the platform data directory
    /// (e.g. `~/.local/share/dailywall`). `~` is expanded.
    pub data_dir: String,
}

/// Root configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DailywallConfig {
    /// Remote feed settings.
    pub feed: FeedConfig,

    /// Polling and cache retention.
    pub sync: SyncConfig,

    /// Storage locations.
    pub storage: StorageConfig,

    /// Zoom factor used when no state file exists yet.
    /// Default: 1.3
    pub default_zoom: f64,
}

impl Default for DailywallConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            sync: SyncConfig::default(),
            storage: StorageConfig::default(),
            default_zoom: DEFAULT_ZOOM_FACTOR,
        }
    }
}

impl DailywallConfig {
    /// Returns the default zoom, falling back when the configured one is unusable.
    #[must_use]
    pub fn default_zoom(&self) -> f64 {
        if self.default_zoom.is_finite() && self.default_zoom > 0.0 {
            self.default_zoom
        } else {
            DEFAULT_ZOOM_FACTOR
        }
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/dailywall/config.jsonc, \
         the platform config directory, or ~/.dailywall.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Legacy configuration file names in home directory.
const LEGACY_CONFIG_FILE_NAMES: &[&str] = &[".dailywall.jsonc", ".dailywall.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/dailywall/config.jsonc` (or `.json`) when set
/// 2. `~/.config/dailywall/config.jsonc` (or `.json`)
/// 3. The platform config directory, e.g. `~/Library/Application Support/dailywall/`
/// 4. `~/.dailywall.jsonc` or `~/.dailywall.json`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let app_dir = PathBuf::from(xdg_config).join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            paths.push(app_dir.join(filename));
        }
    }

    if let Some(home) = dirs::home_dir() {
        let app_dir = home.join(".config").join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            let path = app_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let app_dir = config_dir.join(APP_NAME);
        for filename in CONFIG_FILE_NAMES {
            let path = app_dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    if let Some(home) = dirs::home_dir() {
        for filename in LEGACY_CONFIG_FILE_NAMES {
            paths.push(home.join(filename));
        }
    }

    paths
}

/// Loads the configuration from the first available config file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no configuration file exists in any of the expected
/// locations, or the error of the first existing file that fails to load.
pub fn load_config() -> Result<(DailywallConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads the configuration from a specific file.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if the file is missing, `IoError` if it cannot be
/// read and `ParseError` if it is not valid JSONC.
pub fn load_config_from_path(path: &Path) -> Result<(DailywallConfig, PathBuf), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound);
    }

    let file = fs::File::open(path)?;
    let reader = json_comments::StripComments::new(file);
    let config: DailywallConfig = serde_json::from_reader(reader)?;
    Ok((config, path.to_path_buf()))
}
