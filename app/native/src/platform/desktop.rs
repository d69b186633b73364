//! Desktop integration: applying the background and opening paths.

use std::path::Path;
use std::process::Command;

/// Errors raised by a [`Desktop`] implementation.
#[derive(Debug)]
pub enum DesktopError {
    /// The file to apply or open does not exist.
    FileNotFound(String),
    /// The platform refused to set the background.
    SetWallpaperFailed(String),
    /// The platform opener could not be launched or failed.
    OpenFailed(String),
}

impl std::fmt::Display for DesktopError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "File not found: {path}"),
            Self::SetWallpaperFailed(msg) => write!(f, "Failed to set wallpaper: {msg}"),
            Self::OpenFailed(msg) => write!(f, "Failed to open path: {msg}"),
        }
    }
}

impl std::error::Error for DesktopError {}

/// Platform collaborator used by the engine.
///
/// Failures are reported to the caller, which logs them and carries on.
pub trait Desktop: Send + Sync {
    /// Sets `path` as the desktop background on every screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the platform call fails.
    fn apply_background(&self, path: &Path) -> Result<(), DesktopError>;

    /// Opens a file or folder with the platform's default handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the opener cannot be run.
    fn open_path(&self, path: &Path) -> Result<(), DesktopError>;
}

/// [`Desktop`] backed by the `wallpaper` crate and the system opener.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    fn apply_background(&self, path: &Path) -> Result<(), DesktopError> {
        if !path.exists() {
            return Err(DesktopError::FileNotFound(path.display().to_string()));
        }

        let path_str = path.display().to_string();

        wallpaper::set_from_path(&path_str)
            .map_err(|e| DesktopError::SetWallpaperFailed(e.to_string()))
    }

    fn open_path(&self, path: &Path) -> Result<(), DesktopError> {
        let status = Command::new(opener())
            .arg(path)
            .status()
            .map_err(|e| DesktopError::OpenFailed(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(DesktopError::OpenFailed(format!(
                "{} exited with {status}",
                opener()
            )))
        }
    }
}

/// Returns the platform's "open with default application" command.
const fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}
