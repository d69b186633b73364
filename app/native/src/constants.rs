//! Application-wide constants.

/// Application name, used for data/config directory names and thread prefixes.
pub const APP_NAME: &str = "dailywall";

/// Application version from Cargo.toml.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every feed and image request.
pub const USER_AGENT: &str = concat!("dailywall/", env!("CARGO_PKG_VERSION"));

/// Size of the buffer used when streaming image downloads to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;

/// File name of the engine state document inside the data directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// File name of the favorites ledger inside the data directory.
pub const FAVORITES_FILE_NAME: &str = "favorites.json";

/// Subdirectory holding the remote slot cache.
pub const WALLPAPERS_DIR_NAME: &str = "wallpapers";

/// Subdirectory holding favorite copies.
pub const FAVORITES_DIR_NAME: &str = "favorites";
