//! CLI command definitions using Clap.
//!
//! Top-level commands drive the engine directly (`run`, `refresh`, `status`,
//! navigation, `history`, `zoom`). Grouped commands live in submodules:
//!
//! - `cache` - Slot cache maintenance
//! - `config_cmd` - Configuration file management
//! - `favorite` - Favorites management
//! - `wallpaper` - Handlers for the engine-driven top-level commands

use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::cache::DataPaths;
use crate::constants::{APP_NAME, APP_VERSION};
use crate::engine::Engine;
use crate::error::DailywallError;
use crate::http::HttpTransport;
use crate::model::Collection;
use crate::platform::SystemDesktop;
use crate::{config, schema};

pub mod cache;
pub mod config_cmd;
pub mod favorite;
pub mod wallpaper;

pub use cache::CacheCommands;
pub use config_cmd::ConfigCommands;
pub use favorite::FavoriteCommands;

/// Dailywall CLI - keeps the desktop background in sync with a daily image feed.
#[derive(Parser, Debug)]
#[command(name = "dailywall")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Enable debug logging. `RUST_LOG` takes precedence when set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the synchronization daemon until interrupted.
    ///
    /// Warms the history cache, checks the feed immediately and then on every
    /// check interval. Stops on Ctrl-C.
    Run,

    /// Run a single synchronization cycle and exit.
    Refresh,

    /// Show the current wallpaper as JSON.
    Status,

    /// Show the next (older) wallpaper.
    ///
    /// Walks the remote history first, then continues into favorites.
    Next,

    /// Show the previous (newer) wallpaper.
    Previous,

    /// Jump to a specific wallpaper.
    #[command(after_long_help = r#"Examples:
  dailywall goto remote 0     # Newest image of the feed
  dailywall goto remote 3     # Four days ago
  dailywall goto favorite 0   # Oldest favorite"#)]
    Goto {
        /// Collection to jump into: remote or favorite.
        #[arg(value_name = "COLLECTION")]
        collection: Collection,

        /// Zero-based position within the collection.
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// List the remote history.
    History,

    /// Manage favorites.
    #[command(subcommand)]
    Favorite(FavoriteCommands),

    /// Print or set the zoom factor.
    #[command(after_long_help = r#"Examples:
  dailywall zoom        # Print the current zoom factor
  dailywall zoom 1.5    # Set the zoom factor"#)]
    Zoom {
        /// New zoom factor; must be positive.
        #[arg(value_name = "VALUE")]
        value: Option<f64>,
    },

    /// Cache management commands.
    ///
    /// Manage the downloaded image slots. Favorites are never touched.
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Configuration file management commands.
    ///
    /// Initialize and locate the configuration file.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Outputs a JSON Schema to stdout that describes the structure of the
    /// configuration file. Can be redirected to a file for use with editors
    /// that support JSON Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    ///
    /// Usage:
    ///   eval "$(dailywall completions --shell zsh)"
    ///   dailywall completions --shell fish > ~/.config/fish/completions/dailywall.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<std::path::PathBuf> {
        self.config.as_ref().map(std::path::PathBuf::from)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), DailywallError> {
        if let Some(path) = self.config_path() {
            if !path.exists() {
                return Err(DailywallError::ConfigError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            config::set_custom_config_path(path);
        }

        match &self.command {
            Commands::Cache(cmd) => cache::execute(&data_paths(), cmd),
            Commands::Config(cmd) => config_cmd::execute(cmd),

            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }

            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }

            command => dispatch(command, &open_engine()?),
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, APP_NAME, &mut io::stdout());
    }
}

/// Runs a command that works on the engine.
fn dispatch(command: &Commands, engine: &Arc<Engine>) -> Result<(), DailywallError> {
    match command {
        Commands::Run => wallpaper::run(engine),
        Commands::Refresh => wallpaper::refresh(engine),
        Commands::Status => wallpaper::status(engine),
        Commands::Next => wallpaper::next(engine),
        Commands::Previous => wallpaper::previous(engine),
        Commands::Goto { collection, index } => wallpaper::goto(engine, *collection, *index),
        Commands::History => wallpaper::history(engine),
        Commands::Zoom { value } => wallpaper::zoom(engine, *value),
        Commands::Favorite(cmd) => favorite::execute(engine, cmd),
        Commands::Cache(_)
        | Commands::Config(_)
        | Commands::Schema
        | Commands::Completions { .. } => Err(DailywallError::CommandError(
            "command does not use the engine".to_string(),
        )),
    }
}

/// Data directory from the loaded configuration.
fn data_paths() -> DataPaths { DataPaths::from_config(&config::get_config().storage) }

/// Builds an engine over the configured data directory and the real
/// network and desktop collaborators.
fn open_engine() -> Result<Arc<Engine>, DailywallError> {
    let config = config::get_config();
    let transport = HttpTransport::new(config.feed.timeout())
        .map_err(|err| DailywallError::FeedUnavailable(err.to_string()))?;

    Ok(Arc::new(Engine::new(
        config,
        data_paths(),
        Arc::new(transport),
        Arc::new(SystemDesktop),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Cursor;
    use crate::test_utils::{FakeTransport, RecordingDesktop};

    fn parse(args: &[&str]) -> Cli { Cli::try_parse_from(args).unwrap() }

    #[test]
    fn test_cli_verifies() { Cli::command().debug_assert(); }

    #[test]
    fn test_cli_parses_navigation() {
        assert!(matches!(parse(&["dailywall", "next"]).command, Commands::Next));
        assert!(matches!(parse(&["dailywall", "previous"]).command, Commands::Previous));
        assert!(matches!(parse(&["dailywall", "run"]).command, Commands::Run));
    }

    #[test]
    fn test_cli_parses_goto() {
        let cli = parse(&["dailywall", "goto", "favorite", "2"]);
        match cli.command {
            Commands::Goto { collection, index } => {
                assert_eq!(collection, Collection::Favorite);
                assert_eq!(index, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_collection() {
        assert!(Cli::try_parse_from(["dailywall", "goto", "elsewhere", "0"]).is_err());
        assert!(Cli::try_parse_from(["dailywall", "goto", "remote", "-1"]).is_err());
    }

    #[test]
    fn test_cli_parses_zoom() {
        assert!(matches!(parse(&["dailywall", "zoom"]).command, Commands::Zoom { value: None }));
        match parse(&["dailywall", "zoom", "1.5"]).command {
            Commands::Zoom { value: Some(value) } => assert!((value - 1.5).abs() < f64::EPSILON),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_favorite_subcommands() {
        match parse(&["dailywall", "favorite", "remove", "1700000000"]).command {
            Commands::Favorite(FavoriteCommands::Remove { id }) => assert_eq!(id, "1700000000"),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(matches!(
            parse(&["dailywall", "favorite", "toggle"]).command,
            Commands::Favorite(FavoriteCommands::Toggle)
        ));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = parse(&["dailywall", "status", "--verbose", "--config", "/tmp/dw.jsonc"]);
        assert!(cli.verbose);
        assert_eq!(cli.config_path(), Some(std::path::PathBuf::from("/tmp/dw.jsonc")));
    }

    #[test]
    fn test_cli_parses_completions() {
        let cli = parse(&["dailywall", "completions", "--shell", "zsh"]);
        assert!(matches!(cli.command, Commands::Completions { shell: Shell::Zsh }));
    }

    fn engine(dir: &tempfile::TempDir) -> Arc<Engine> {
        let transport = Arc::new(FakeTransport::default());
        transport.set_feed(&[("/th?id=A", "20250409"), ("/th?id=B", "20250408")]);
        Arc::new(Engine::new(
            &config::DailywallConfig::default(),
            DataPaths::new(dir.path()),
            transport,
            Arc::new(RecordingDesktop::default()),
        ))
    }

    #[test]
    fn test_engine_commands_dispatch() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let engine = engine(&temp_dir);

        for args in [
            &["dailywall", "refresh"][..],
            &["dailywall", "status"][..],
            &["dailywall", "next"][..],
            &["dailywall", "previous"][..],
            &["dailywall", "goto", "remote", "1"][..],
            &["dailywall", "history"][..],
            &["dailywall", "zoom", "1.5"][..],
            &["dailywall", "favorite", "add"][..],
        ] {
            let cli = parse(args);
            assert!(dispatch(&cli.command, &engine).is_ok(), "{args:?} failed");
        }

        assert_eq!(engine.cursor(), Some(Cursor::new(Collection::Remote, 1)));
        assert_eq!(engine.favorite_count(), 1);
        assert!((engine.zoom_factor() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engine_dispatch_reports_command_errors() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let engine = engine(&temp_dir);

        let goto = parse(&["dailywall", "goto", "favorite", "0"]);
        assert!(matches!(
            dispatch(&goto.command, &engine),
            Err(DailywallError::InvalidArguments(_))
        ));
        assert!(dispatch(&parse(&["dailywall", "schema"]).command, &engine).is_err());
    }

    #[test]
    fn test_missing_custom_config_is_an_error() {
        let cli = parse(&["dailywall", "schema", "--config", "/nonexistent/dailywall.jsonc"]);
        assert!(matches!(cli.execute(), Err(DailywallError::ConfigError(_))));
    }
}
