//! Favorites CLI commands.

use clap::Subcommand;
use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cli::output;
use crate::engine::Engine;
use crate::error::DailywallError;

/// Favorites subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum FavoriteCommands {
    /// Add the current wallpaper to favorites.
    Add,

    /// Remove a favorite by id.
    #[command(after_long_help = r#"Examples:
  dailywall favorite list               # Find the id
  dailywall favorite remove 1712650000  # Remove it"#)]
    Remove {
        /// Favorite id, as shown by `dailywall favorite list`.
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Add the current wallpaper to favorites, or remove it if it is one.
    Toggle,

    /// List favorites in the order they were added.
    List,

    /// Open the favorites folder in the file manager.
    Open,
}

/// Execute favorites subcommands.
///
/// # Errors
///
/// Returns an error if the engine reports the operation failed.
pub fn execute(engine: &Engine, cmd: &FavoriteCommands) -> Result<(), DailywallError> {
    match cmd {
        FavoriteCommands::Add => add(engine),
        FavoriteCommands::Remove { id } => remove(engine, id),
        FavoriteCommands::Toggle => toggle(engine),
        FavoriteCommands::List => {
            list(engine);
            Ok(())
        }
        FavoriteCommands::Open => {
            if engine.open_favorites_folder() {
                Ok(())
            } else {
                Err(DailywallError::CommandError(format!(
                    "Could not open {}",
                    engine.paths().favorites_dir().display()
                )))
            }
        }
    }
}

fn add(engine: &Engine) -> Result<(), DailywallError> {
    if !engine.add_current_to_favorites() {
        return Err(DailywallError::CommandError(
            "Could not add the current wallpaper to favorites.".to_string(),
        ));
    }

    let id = engine.current_favorite_id().unwrap_or_default();
    println!("Added to favorites ({}).", id.cyan());
    Ok(())
}

fn remove(engine: &Engine, id: &str) -> Result<(), DailywallError> {
    if !engine.remove_favorite(id) {
        return Err(DailywallError::InvalidArguments(format!("No favorite with id '{id}'.")));
    }

    println!("Removed favorite {}.", id.cyan());
    Ok(())
}

fn toggle(engine: &Engine) -> Result<(), DailywallError> {
    match engine.current_favorite_id() {
        Some(id) => remove(engine, &id),
        None => add(engine),
    }
}

#[derive(Tabled)]
struct FavoriteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Added")]
    added: String,
    #[tabled(rename = "Caption")]
    caption: String,
    #[tabled(rename = "File")]
    present: String,
}

fn list(engine: &Engine) {
    let favorites = engine.favorites();
    if favorites.is_empty() {
        println!("No favorites yet. Use `dailywall favorite add` to pin the current wallpaper.");
        return;
    }

    let count = favorites.len();
    let rows: Vec<FavoriteRow> = favorites
        .into_iter()
        .map(|entry| FavoriteRow {
            present: output::format_bool(entry.file_path.is_file()),
            id: entry.id,
            date: entry.record.date.to_string(),
            added: entry.added_date.format("%Y-%m-%d %H:%M").to_string(),
            caption: output::truncate(&entry.record.caption, 50),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::last()).with(Alignment::center()))
        .to_string();

    println!("{}", format!("Favorites ({count})").bold());
    println!("{table}");
}
