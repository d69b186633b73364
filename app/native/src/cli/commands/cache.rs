//! Cache CLI commands.

use clap::Subcommand;

use crate::cache::{self, DataPaths};
use crate::error::DailywallError;

/// Cache subcommands for managing downloaded slots.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum CacheCommands {
    /// Remove every cached slot image and thumbnail.
    ///
    /// Slots are downloaded again on demand. Favorites and the saved state
    /// are kept.
    #[command(after_long_help = r#"Examples:
  dailywall cache clear   # Remove cached slots"#)]
    Clear,

    /// Show the cache directory location.
    #[command(after_long_help = r#"Examples:
  dailywall cache path    # Print the cache directory path"#)]
    Path,
}

/// Execute cache subcommands.
///
/// # Errors
///
/// Returns an error if cached files cannot be removed.
pub fn execute(paths: &DataPaths, cmd: &CacheCommands) -> Result<(), DailywallError> {
    match cmd {
        CacheCommands::Clear => {
            if !paths.wallpapers_dir().exists() {
                println!("Cache directory does not exist. Nothing to clear.");
                return Ok(());
            }

            let bytes_freed = cache::clear_cache(paths).map_err(|err| {
                DailywallError::IoError(format!("Failed to clear cache: {err}"))
            })?;
            println!("Cache cleared successfully. Freed {}.", cache::format_bytes(bytes_freed));
        }
        CacheCommands::Path => println!("{}", paths.wallpapers_dir().display()),
    }
    Ok(())
}
