//! Engine-driven wallpaper commands.
//!
//! Each handler works on a freshly loaded [`Engine`]; the persisted state is
//! the only thing shared with a running daemon.

use std::sync::Arc;

use colored::Colorize;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::cli::output;
use crate::engine::{Engine, SyncOutcome};
use crate::error::DailywallError;
use crate::model::{Collection, CurrentWallpaper};
use crate::navigation::Cursor;
use crate::sync::SyncLoop;

/// Runs the sync loop until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the signal runtime cannot be created.
pub fn run(engine: &Arc<Engine>) -> Result<(), DailywallError> {
    engine.on_download_completed(|view| {
        tracing::info!(date = %view.record.date, caption = %view.record.caption, "new wallpaper");
    });
    engine.on_wallpaper_changed(|view| {
        tracing::debug!(
            cursor = %Cursor::new(view.collection, view.index),
            path = %view.file_path.display(),
            "wallpaper changed"
        );
    });

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let mut sync = SyncLoop::start(engine);

    let interrupted = runtime.block_on(tokio::signal::ctrl_c());
    tracing::info!("shutting down");
    if !sync.stop() {
        tracing::warn!("sync loop still busy at exit");
    }

    interrupted
        .map_err(|err| DailywallError::CommandError(format!("signal handler failed: {err}")))
}

/// Runs one sync cycle.
///
/// # Errors
///
/// Returns the cycle's feed or cache error.
pub fn refresh(engine: &Engine) -> Result<(), DailywallError> {
    match engine.sync_once(true)? {
        SyncOutcome::Updated => println!("Downloaded and applied a new wallpaper."),
        SyncOutcome::Reapplied | SyncOutcome::Unchanged => {
            println!("Wallpaper is already up to date.");
        }
    }
    print_current(engine.current().as_ref());
    Ok(())
}

/// Prints the current wallpaper and engine counters as JSON.
///
/// # Errors
///
/// Returns an error if the view cannot be serialized.
pub fn status(engine: &Engine) -> Result<(), DailywallError> {
    let value = serde_json::json!({
        "current": serde_json::to_value(engine.current())?,
        "remote_count": engine.remote_count(),
        "favorite_count": engine.favorite_count(),
        "zoom_factor": engine.zoom_factor(),
        "data_dir": engine.paths().root().display().to_string(),
    });
    output::print_highlighted_json(&value);
    Ok(())
}

/// Moves toward older items.
///
/// # Errors
///
/// Returns an error when there is nothing older or the image is unavailable.
pub fn next(engine: &Engine) -> Result<(), DailywallError> {
    moved(engine, engine.next(), "No older wallpaper to show.")
}

/// Moves toward newer items.
///
/// # Errors
///
/// Returns an error when there is nothing newer or the image is unavailable.
pub fn previous(engine: &Engine) -> Result<(), DailywallError> {
    moved(engine, engine.previous(), "No newer wallpaper to show.")
}

/// Jumps to an explicit position.
///
/// # Errors
///
/// Returns an error when the position does not exist.
pub fn goto(engine: &Engine, collection: Collection, index: usize) -> Result<(), DailywallError> {
    let total = match collection {
        Collection::Remote => engine.remote_count(),
        Collection::Favorite => engine.favorite_count(),
    };
    if index >= total {
        return Err(DailywallError::InvalidArguments(format!(
            "{collection} has {total} item(s); index {index} is out of range."
        )));
    }

    moved(engine, engine.goto(collection, index), "Could not show the requested wallpaper.")
}

fn moved(engine: &Engine, ok: bool, failure: &str) -> Result<(), DailywallError> {
    if !ok {
        return Err(DailywallError::CommandError(failure.to_string()));
    }
    print_current(engine.current().as_ref());
    Ok(())
}

fn print_current(current: Option<&CurrentWallpaper>) {
    let Some(current) = current else {
        println!("No wallpaper yet. Run `dailywall refresh` first.");
        return;
    };

    let position = format!("{} {}/{}", current.collection, current.index + 1, current.total);
    let star = current.favorite_id.as_ref().map(|_| " ★".yellow().to_string()).unwrap_or_default();
    println!("{}{star} {}", position.bold(), current.record.date);
    println!("{}", current.record.caption);
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Caption")]
    caption: String,
    #[tabled(rename = "Image")]
    cached: String,
    #[tabled(rename = "Favorite")]
    favorite: String,
    #[tabled(rename = "Shown")]
    shown: String,
}

/// Prints the remote history snapshot as a table.
///
/// # Errors
///
/// This command does not fail; the signature matches the other handlers.
#[allow(clippy::unnecessary_wraps)]
pub fn history(engine: &Engine) -> Result<(), DailywallError> {
    let history = engine.history();
    if history.is_empty() {
        println!("No history yet. Run `dailywall refresh` first.");
        return Ok(());
    }

    let favorites = engine.favorites();
    let cursor = engine.cursor();
    let rows: Vec<HistoryRow> = history
        .iter()
        .enumerate()
        .map(|(index, record)| HistoryRow {
            index,
            date: record.date.to_string(),
            caption: output::truncate(&record.caption, 60),
            cached: output::format_bool(engine.paths().slot_image(index).is_file()),
            favorite: output::format_bool(
                favorites.iter().any(|entry| entry.record.picture_url == record.picture_url),
            ),
            shown: if cursor == Some(Cursor::new(Collection::Remote, index)) {
                "▶".green().to_string()
            } else {
                String::new()
            },
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .with(Modify::new(Columns::new(3..6)).with(Alignment::center()))
        .to_string();

    println!("{}", format!("History ({})", history.len()).bold());
    println!("{table}");
    Ok(())
}

/// Prints or sets the zoom factor.
///
/// # Errors
///
/// Returns an error for a non-positive or non-finite value.
pub fn zoom(engine: &Engine, value: Option<f64>) -> Result<(), DailywallError> {
    let Some(value) = value else {
        println!("{}", engine.zoom_factor());
        return Ok(());
    };

    if !(value.is_finite() && value > 0.0) {
        return Err(DailywallError::InvalidArguments(format!(
            "Zoom factor must be a positive number, got {value}."
        )));
    }

    if engine.set_zoom_factor(value) {
        println!("Zoom factor set to {value}.");
    } else {
        println!("Zoom factor is already {value}.");
    }
    Ok(())
}
