//! Remote slot cache.
//!
//! Slot `n` is the `n`-th most recent remote image. A slot is two files, a
//! full image and a thumbnail, and a file that exists is considered fresh:
//! no hashes or validators are compared. Callers that know a slot now maps to
//! a different record call [`ImageCache::invalidate`] first.
//!
//! Within a process the cache also remembers which URL each file was
//! downloaded from. Asking for a slot with a different record replaces the
//! file instead of returning it, so two writers racing on one slot with
//! different records cannot leave a file behind that a later call mistakes
//! for its own.
//!
//! Writes to one slot are serialized by a per-slot lock; different slots
//! download in parallel. No engine-wide lock is held while downloading.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::fs::{remove_if_exists, write_atomic};
use crate::cache::DataPaths;
use crate::error::{DailywallError, Result};
use crate::http::Transport;
use crate::model::ImageRecord;

/// Local files of a cached slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSlot {
    /// Full image; `None` for slots outside the full-image retention.
    pub image: Option<PathBuf>,
    pub thumbnail: PathBuf,
}

/// Downloads and tracks slot files under `wallpapers/`.
pub struct ImageCache {
    paths: DataPaths,
    transport: Arc<dyn Transport>,
    max_full_image_slots: usize,
    download_attempts: u32,
    slot_locks: Mutex<HashMap<usize, Arc<Mutex<()>>>>,
    owners: Mutex<HashMap<PathBuf, String>>,
}

impl ImageCache {
    #[must_use]
    pub fn new(
        paths: DataPaths,
        transport: Arc<dyn Transport>,
        max_full_image_slots: usize,
        download_attempts: u32,
    ) -> Self {
        Self {
            paths,
            transport,
            max_full_image_slots,
            download_attempts: download_attempts.max(1),
            slot_locks: Mutex::new(HashMap::new()),
            owners: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `slot` keeps its full image under the retention policy.
    #[must_use]
    pub const fn retains_full_image(&self, slot: usize) -> bool { slot < self.max_full_image_slots }

    #[must_use]
    pub fn image_path(&self, slot: usize) -> PathBuf { self.paths.slot_image(slot) }

    #[must_use]
    pub fn thumbnail_path(&self, slot: usize) -> PathBuf { self.paths.slot_thumbnail(slot) }

    /// Ensures the slot's files exist, downloading what is missing.
    ///
    /// The thumbnail is always cached; the full image only for slots below
    /// the full-image retention. Files already on disk are returned without
    /// any network access.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::CacheWrite`] if a download keeps failing.
    pub fn ensure_cached(&self, slot: usize, record: &ImageRecord) -> Result<CachedSlot> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock();

        let image = if self.retains_full_image(slot) {
            let path = self.image_path(slot);
            self.download_if_missing(&record.picture_url, &path)?;
            Some(path)
        } else {
            None
        };

        let thumbnail = self.thumbnail_path(slot);
        self.download_if_missing(&record.thumbnail_url, &thumbnail)?;

        Ok(CachedSlot { image, thumbnail })
    }

    /// Ensures the slot's full image exists regardless of retention.
    ///
    /// Used when an image is about to be displayed.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::CacheWrite`] if the download keeps failing.
    pub fn ensure_image(&self, slot: usize, record: &ImageRecord) -> Result<PathBuf> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock();

        let path = self.image_path(slot);
        self.download_if_missing(&record.picture_url, &path)?;
        Ok(path)
    }

    /// Ensures the slot's thumbnail exists.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::CacheWrite`] if the download keeps failing.
    pub fn ensure_thumbnail(&self, slot: usize, record: &ImageRecord) -> Result<PathBuf> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock();

        let path = self.thumbnail_path(slot);
        self.download_if_missing(&record.thumbnail_url, &path)?;
        Ok(path)
    }

    /// Deletes both files of a slot so the next `ensure_*` call re-downloads.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn invalidate(&self, slot: usize) -> Result<()> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock();

        let removed_image = self.remove(&self.image_path(slot))?;
        let removed_thumb = self.remove(&self.thumbnail_path(slot))?;
        if removed_image || removed_thumb {
            tracing::debug!(slot, "invalidated cached slot");
        }
        Ok(())
    }

    /// Deletes the slot's files that were downloaded for `record`.
    ///
    /// Files written for any other record, or of unknown origin, are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching file cannot be removed.
    pub fn discard(&self, slot: usize, record: &ImageRecord) -> Result<()> {
        let lock = self.slot_lock(slot);
        let _guard = lock.lock();

        for (path, url) in [
            (self.image_path(slot), &record.picture_url),
            (self.thumbnail_path(slot), &record.thumbnail_url),
        ] {
            let owned = self.owners.lock().get(&path) == Some(url);
            if owned && self.remove(&path)? {
                tracing::debug!(slot, url, "discarded slot file");
            }
        }
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        self.owners.lock().remove(path);
        Ok(remove_if_exists(path)?)
    }

    fn slot_lock(&self, slot: usize) -> Arc<Mutex<()>> {
        Arc::clone(self.slot_locks.lock().entry(slot).or_default())
    }

    fn download_if_missing(&self, url: &str, path: &Path) -> Result<()> {
        let foreign = self.owners.lock().get(path).is_some_and(|owner| owner != url);
        if foreign {
            tracing::debug!(url, path = %path.display(), "slot holds another record, replacing");
            self.remove(path)?;
        } else if path.is_file() {
            return Ok(());
        }

        let mut last_error = None;
        for attempt in 1..=self.download_attempts {
            match self.download(url, path) {
                Ok(bytes) => {
                    tracing::debug!(url, path = %path.display(), bytes, "cached file");
                    self.owners.lock().insert(path.to_path_buf(), url.to_string());
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(url, attempt, error = %err, "download failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DailywallError::CacheWrite(url.to_string())))
    }

    fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let mut written = 0;
        write_atomic(path, |file: &mut File| {
            let mut writer = BufWriter::new(file);
            written = self
                .transport
                .fetch_to(url, &mut writer)
                .map_err(|err| DailywallError::CacheWrite(err.to_string()))?;
            writer.flush()?;
            Ok::<(), DailywallError>(())
        })
        .map_err(|err| match err {
            DailywallError::IoError(message) => DailywallError::CacheWrite(message),
            other => other,
        })?;
        Ok(written)
    }
}
