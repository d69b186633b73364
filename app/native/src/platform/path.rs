//! Shell-like path expansion for user supplied paths.

use std::path::PathBuf;

/// Expands a leading `~` to the home directory.
///
/// Blank input yields an empty path so callers can treat it as "unset".
/// Absolute and relative paths are returned unchanged.
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}
