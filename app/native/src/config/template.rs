//! Configuration template generation.
//!
//! Generates a commented configuration template with all available options.

use std::fs;
use std::path::Path;

/// Generates a configuration template with all options commented out.
#[must_use]
pub fn generate_config_template() -> String {
    r#"// Dailywall Configuration File
// ============================
// This file uses JSONC format (JSON with comments).
// All options below are commented out and show their default values.
// Uncomment and modify the options you want to configure.

{
  // ============================================================================
  // Feed
  // ============================================================================
  // "feed": {
  //   // Metadata endpoint (queried with format=xml&idx=&n=&mkt=)
  //   "endpoint": "https://www.bing.com/HPImageArchive.aspx",
  //
  //   // Host prepended to each image's urlBase
  //   "host": "https://www.bing.com",
  //
  //   // Market code
  //   "market": "en-US",
  //
  //   // URL suffixes for the full image and the thumbnail
  //   "imageSuffix": "_UHD.jpg",
  //   "thumbnailSuffix": "_320x240.jpg",
  //
  //   // Request timeout in seconds
  //   "timeoutSecs": 30
  // },

  // ============================================================================
  // Synchronization
  // ============================================================================
  // "sync": {
  //   // Seconds between feed checks
  //   "checkInterval": 3600,
  //
  //   // Seconds before retrying after a failed check (doubles on repeated failures)
  //   "retryInterval": 60,
  //
  //   // Days of history kept in the local cache
  //   "historyDays": 7,
  //
  //   // How many of the most recent days keep the full-resolution image
  //   "maxFullImageSlots": 3,
  //
  //   // Attempts per downloaded file
  //   "downloadAttempts": 3,
  //
  //   // Milliseconds to wait for the background loop on shutdown
  //   "shutdownTimeoutMs": 1000
  // },

  // ============================================================================
  // Storage
  // ============================================================================
  // "storage": {
  //   // Data directory; empty uses the platform data directory
  //   "dataDir": ""
  // },

  // Zoom factor used before one has been chosen
  // "defaultZoom": 1.3
}
"#
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, generate_config_template())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::config::types::{DailywallConfig, load_config_from_path};

    #[test]
    fn test_template_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.jsonc");

        create_config_file(&path).unwrap();
        let (config, _) = load_config_from_path(&path).unwrap();
        assert_eq!(config, DailywallConfig::default());
    }

    #[test]
    fn test_template_mentions_every_section() {
        let template = generate_config_template();
        for key in ["\"feed\"", "\"sync\"", "\"storage\"", "\"defaultZoom\""] {
            assert!(template.contains(key), "template should mention {key}");
        }
    }
}
