//! Data directory layout and cache maintenance.
//!
//! Everything Dailywall persists lives under a single data directory:
//! `state.json`, `favorites.json`, the slot cache in `wallpapers/` and
//! the favorite copies in `favorites/`. The directory defaults to the
//! platform data directory (`~/.local/share/dailywall` on Linux,
//! `~/Library/Application Support/dailywall` on macOS), with a fallback
//! to `/tmp/dailywall` when no home is available.

use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::constants::{
    APP_NAME, FAVORITES_DIR_NAME, FAVORITES_FILE_NAME, STATE_FILE_NAME, WALLPAPERS_DIR_NAME,
};
use crate::platform::path::expand;

/// Resolved on-disk locations for one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Uses `root` as the data directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    /// Resolves the data directory from the storage configuration.
    #[must_use]
    pub fn from_config(storage: &StorageConfig) -> Self {
        let configured = expand(&storage.data_dir);
        if configured.as_os_str().is_empty() {
            Self::new(default_data_dir())
        } else {
            Self::new(configured)
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path { &self.root }

    /// Engine state file.
    #[must_use]
    pub fn state_file(&self) -> PathBuf { self.root.join(STATE_FILE_NAME) }

    /// Favorites ledger.
    #[must_use]
    pub fn ledger_file(&self) -> PathBuf { self.root.join(FAVORITES_FILE_NAME) }

    /// Directory holding the remote slot cache.
    #[must_use]
    pub fn wallpapers_dir(&self) -> PathBuf { self.root.join(WALLPAPERS_DIR_NAME) }

    /// Directory holding favorite copies.
    #[must_use]
    pub fn favorites_dir(&self) -> PathBuf { self.root.join(FAVORITES_DIR_NAME) }

    /// Full image path of a slot. Slot 0 always uses the fixed `current` name.
    #[must_use]
    pub fn slot_image(&self, slot: usize) -> PathBuf {
        let name = if slot == 0 {
            "current.jpg".to_string()
        } else {
            format!("wallpaper_{slot}.jpg")
        };
        self.wallpapers_dir().join(name)
    }

    /// Thumbnail path of a slot.
    #[must_use]
    pub fn slot_thumbnail(&self, slot: usize) -> PathBuf {
        let name = if slot == 0 {
            "current_thumb.jpg".to_string()
        } else {
            format!("wallpaper_{slot}_thumb.jpg")
        };
        self.wallpapers_dir().join(name)
    }

    /// Path of the private copy of a favorite.
    #[must_use]
    pub fn favorite_file(&self, id: &str) -> PathBuf {
        self.favorites_dir().join(format!("favorite_{id}.jpg"))
    }
}

/// Returns the default data directory for the application.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!("/tmp/{APP_NAME}")),
        |data| data.join(APP_NAME),
    )
}

/// Clears the remote slot cache.
///
/// Only `wallpapers/` is removed; state and favorites are left untouched.
///
/// # Returns
///
/// * `Ok(bytes_freed)` - The approximate number of bytes freed
/// * `Err(error)` - If the operation failed
///
/// # Errors
///
/// Returns an error if files cannot be removed. A missing cache directory
/// is not an error and yields `Ok(0)`.
pub fn clear_cache(paths: &DataPaths) -> std::io::Result<u64> {
    let cache_dir = paths.wallpapers_dir();

    if !cache_dir.exists() {
        return Ok(0);
    }

    let bytes_freed = calculate_dir_size(&cache_dir)?;
    std::fs::remove_dir_all(&cache_dir)?;

    tracing::info!(path = %cache_dir.display(), bytes_freed, "cleared slot cache");
    Ok(bytes_freed)
}

/// Calculates the total size of a directory in bytes.
fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;

    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                total += calculate_dir_size(&path)?;
            } else {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
    }

    Ok(total)
}

/// Formats a byte count as a human-readable string.
///
/// # Returns
///
/// A human-readable string like "1.50 MB" or "256 bytes"
#[must_use]
#[allow(clippy::cast_precision_loss)] // Precision loss is acceptable for human-readable output
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
