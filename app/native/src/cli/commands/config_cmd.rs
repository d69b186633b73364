//! Config CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::cli::output;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{self, config_paths};
use crate::error::DailywallError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Write a configuration file with every option documented.
    ///
    /// All options are commented out, so the file starts out equivalent to
    /// the built-in defaults.
    #[command(after_long_help = r#"Examples:
  dailywall config init                            # Default location
  dailywall config init --force                    # Overwrite existing file
  dailywall config init --path ~/dailywall.jsonc   # Custom location
  dailywall config init --stdout                   # Print the template"#)]
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long, short)]
        force: bool,

        /// Where to write the file instead of the default location.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the template to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the configuration search paths and which one is in use.
    Path,

    /// Print the effective configuration as JSON.
    Show,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be written.
pub fn execute(cmd: &ConfigCommands) -> Result<(), DailywallError> {
    match cmd {
        ConfigCommands::Init { stdout: true, .. } => {
            println!("{}", generate_config_template());
            Ok(())
        }
        ConfigCommands::Init { force, path, .. } => init_config(*force, path.as_deref()),
        ConfigCommands::Path => {
            show_config_paths();
            Ok(())
        }
        ConfigCommands::Show => {
            output::print_highlighted_json(&serde_json::to_value(config::get_config())?);
            Ok(())
        }
    }
}

fn init_config(force: bool, custom_path: Option<&Path>) -> Result<(), DailywallError> {
    let config_path = custom_path.map(Path::to_path_buf).unwrap_or_else(|| {
        config_paths().into_iter().next().unwrap_or_else(|| PathBuf::from("config.jsonc"))
    });

    if config_path.exists() && !force {
        return Err(DailywallError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path).map_err(|err| {
        DailywallError::ConfigError(format!(
            "Failed to create config file {}: {err}",
            config_path.display()
        ))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    Ok(())
}

fn show_config_paths() {
    let active = config::get_config_path();
    if let Some(path) = active {
        println!("Active: {}\n", path.display());
    }

    println!("Search paths (in priority order):");
    for (i, path) in config_paths().iter().enumerate() {
        let marker = if active.is_some_and(|active| active == path) {
            " (active)"
        } else if path.exists() {
            " (exists)"
        } else {
            ""
        };
        println!("  {}. {}{marker}", i + 1, path.display());
    }

    if active.is_none() {
        println!("\nNo configuration file in use; built-in defaults apply.");
        println!("Run 'dailywall config init' to create one.");
    }
}
