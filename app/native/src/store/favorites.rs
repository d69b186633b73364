//! Favorites store.
//!
//! Favorites are private copies under `favorites/` plus a JSON ledger
//! (`{"favorites": [...]}`) that is rewritten in full on every mutation.
//! All operations are serialized by the store's own lock, so the engine and
//! the CLI can share one instance across threads.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, Timelike};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::fs::{copy_atomic, remove_if_exists, write_json_atomic};
use crate::cache::DataPaths;
use crate::error::{DailywallError, Result};
use crate::model::{Collection, FavoriteEntry, ImageRecord};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Ledger {
    #[serde(default)]
    favorites: Vec<FavoriteEntry>,
}

/// Finds the favorite pinned from `url` in a snapshot.
#[must_use]
pub fn find_by_picture_url<'a>(
    favorites: &'a [FavoriteEntry],
    url: &str,
) -> Option<&'a FavoriteEntry> {
    favorites.iter().find(|entry| entry.record.picture_url == url)
}

/// Durable collection of user-pinned images, in insertion order.
pub struct FavoritesStore {
    paths: DataPaths,
    lock: Mutex<()>,
}

impl FavoritesStore {
    #[must_use]
    pub const fn new(paths: DataPaths) -> Self { Self { paths, lock: Mutex::new(()) } }

    /// Pins `record`, copying `source` into the favorites directory.
    ///
    /// If a favorite with the same picture URL already exists it is returned
    /// unchanged and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::SourceMissing`] if `source` is not a file and
    /// [`DailywallError::Persistence`] if the copy or the ledger write fails.
    pub fn add(&self, record: &ImageRecord, source: &Path) -> Result<FavoriteEntry> {
        self.add_at(record, source, Local::now())
    }

    fn add_at(
        &self,
        record: &ImageRecord,
        source: &Path,
        now: DateTime<Local>,
    ) -> Result<FavoriteEntry> {
        let _guard = self.lock.lock();

        if !source.is_file() {
            return Err(DailywallError::SourceMissing(source.display().to_string()));
        }

        let mut ledger = self.read_ledger()?;
        if let Some(existing) = find_by_picture_url(&ledger.favorites, &record.picture_url) {
            tracing::debug!(id = %existing.id, "image already a favorite");
            return Ok(existing.clone());
        }

        let id = self.next_id(&ledger, now.timestamp());
        let destination = self.paths.favorite_file(&id);
        copy_atomic(source, &destination).map_err(|err| {
            DailywallError::Persistence(format!(
                "failed to copy {} to favorites: {err}",
                source.display()
            ))
        })?;

        let added_date = now.naive_local();
        let entry = FavoriteEntry {
            id,
            record: ImageRecord { source: Collection::Favorite, ..record.clone() },
            file_path: std::path::absolute(&destination).unwrap_or(destination),
            added_date: added_date.with_nanosecond(0).unwrap_or(added_date),
        };
        ledger.favorites.push(entry.clone());

        if let Err(err) = self.write_ledger(&ledger) {
            let _ = remove_if_exists(&entry.file_path);
            return Err(err);
        }

        tracing::info!(id = %entry.id, url = %entry.record.picture_url, "added favorite");
        Ok(entry)
    }

    /// Removes the favorite `id` and deletes its file.
    ///
    /// Returns `false` without touching the ledger when `id` is unknown. A
    /// missing image file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::Persistence`] if the ledger cannot be read or
    /// rewritten.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock();

        let mut ledger = self.read_ledger()?;
        let Some(position) = ledger.favorites.iter().position(|entry| entry.id == id) else {
            return Ok(false);
        };

        let entry = ledger.favorites.remove(position);
        if let Err(err) = remove_if_exists(&entry.file_path) {
            tracing::warn!(
                id,
                path = %entry.file_path.display(),
                error = %err,
                "failed to delete favorite file"
            );
        }

        self.write_ledger(&ledger)?;
        tracing::info!(id, "removed favorite");
        Ok(true)
    }

    /// Returns the id of the favorite with this picture URL.
    #[must_use]
    pub fn find_by_picture_url(&self, url: &str) -> Option<String> {
        find_by_picture_url(&self.list(), url).map(|entry| entry.id.clone())
    }

    /// Returns all favorites in insertion order.
    ///
    /// An unreadable ledger is logged and treated as empty.
    #[must_use]
    pub fn list(&self) -> Vec<FavoriteEntry> {
        let _guard = self.lock.lock();
        match self.read_ledger() {
            Ok(ledger) => ledger.favorites,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read favorites ledger");
                Vec::new()
            }
        }
    }

    /// Directory holding the favorite copies.
    #[must_use]
    pub fn directory(&self) -> std::path::PathBuf { self.paths.favorites_dir() }

    fn next_id(&self, ledger: &Ledger, timestamp: i64) -> String {
        let mut candidate = timestamp;
        loop {
            let id = candidate.to_string();
            let taken = ledger.favorites.iter().any(|entry| entry.id == id)
                || self.paths.favorite_file(&id).exists();
            if !taken {
                return id;
            }
            candidate += 1;
        }
    }

    fn read_ledger(&self) -> Result<Ledger> {
        let path = self.paths.ledger_file();
        if !path.exists() {
            return Ok(Ledger::default());
        }

        let content = fs::read_to_string(&path).map_err(|err| {
            DailywallError::Persistence(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|err| {
            DailywallError::Persistence(format!("corrupt ledger {}: {err}", path.display()))
        })
    }

    fn write_ledger(&self, ledger: &Ledger) -> Result<()> {
        let path = self.paths.ledger_file();
        write_json_atomic(&path, ledger).map_err(|err| {
            DailywallError::Persistence(format!("failed to write {}: {err}", path.display()))
        })
    }
}
