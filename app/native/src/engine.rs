//! The shared wallpaper engine.
//!
//! One [`Engine`] instance is shared (behind an `Arc`) by the background sync
//! loop and by interactive callers. The mutable state (the persisted
//! [`EngineState`], which includes the remote history, plus the favorites
//! snapshot) sits behind a single mutex. Network and desktop calls are made
//! without holding it; the lock is taken only to read inputs and to commit
//! results. Every committed mutation is persisted before the matching
//! notification is published, and notifications run outside the lock.
//!
//! Interactive operations (`next`, `previous`, `goto`, favorites, zoom)
//! never return errors: failures are logged and reported as `false`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::cache::DataPaths;
use crate::config::{DailywallConfig, SyncConfig};
use crate::error::{DailywallError, Result};
use crate::events::{Notifications, SubscriptionId};
use crate::feed::FeedClient;
use crate::http::Transport;
use crate::model::{Collection, CurrentWallpaper, EngineState, FavoriteEntry, ImageRecord};
use crate::navigation::{Cursor, Sizes};
use crate::platform::Desktop;
use crate::store::favorites::find_by_picture_url;
use crate::store::{FavoritesStore, ImageCache, StateStore};

/// What a single sync cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new image was downloaded and applied.
    Updated,
    /// Nothing new; the known wallpaper was applied again (first cycle only).
    Reapplied,
    /// Nothing new.
    Unchanged,
}

/// The item a navigation step resolved to.
enum Target {
    Remote(ImageRecord),
    Favorite(FavoriteEntry),
}

impl Target {
    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Remote(a), Self::Remote(b)) => a.picture_url == b.picture_url,
            (Self::Favorite(a), Self::Favorite(b)) => a.id == b.id,
            _ => false,
        }
    }
}

struct Shared {
    state: EngineState,
    favorites: Vec<FavoriteEntry>,
}

impl Shared {
    fn sizes(&self) -> Sizes { Sizes::new(self.state.history.len(), self.favorites.len()) }

    fn cursor(&self) -> Option<Cursor> {
        Cursor::new(self.state.current_source, self.state.current_index).normalize(self.sizes())
    }

    fn target(&self, cursor: Cursor) -> Option<Target> {
        match cursor.collection {
            Collection::Remote => self.state.history.get(cursor.index).cloned().map(Target::Remote),
            Collection::Favorite => self.favorites.get(cursor.index).cloned().map(Target::Favorite),
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.state.current_source = cursor.collection;
        self.state.current_index = cursor.index;
    }
}

/// Synchronization and navigation engine.
pub struct Engine {
    sync: SyncConfig,
    paths: DataPaths,
    feed: FeedClient,
    cache: ImageCache,
    favorites: FavoritesStore,
    state_store: StateStore,
    desktop: Arc<dyn Desktop>,
    notifications: Notifications,
    shared: Mutex<Shared>,
}

impl Engine {
    /// Builds an engine over `paths`, loading the persisted state and the
    /// favorites ledger.
    #[must_use]
    pub fn new(
        config: &DailywallConfig,
        paths: DataPaths,
        transport: Arc<dyn Transport>,
        desktop: Arc<dyn Desktop>,
    ) -> Self {
        let state_store = StateStore::new(paths.state_file(), config.default_zoom());
        let favorites = FavoritesStore::new(paths.clone());
        let cache = ImageCache::new(
            paths.clone(),
            Arc::clone(&transport),
            config.sync.max_full_image_slots,
            config.sync.download_attempts(),
        );

        let state = state_store.load();
        let snapshot = favorites.list();
        tracing::debug!(
            history = state.history.len(),
            favorites = snapshot.len(),
            cursor = %Cursor::new(state.current_source, state.current_index),
            "engine state loaded"
        );

        Self {
            sync: config.sync.clone(),
            feed: FeedClient::new(transport, config.feed.clone()),
            cache,
            favorites,
            state_store,
            desktop,
            notifications: Notifications::default(),
            shared: Mutex::new(Shared { state, favorites: snapshot }),
            paths,
        }
    }

    #[must_use]
    pub const fn sync_config(&self) -> &SyncConfig { &self.sync }

    #[must_use]
    pub const fn paths(&self) -> &DataPaths { &self.paths }

    #[must_use]
    pub const fn notifications(&self) -> &Notifications { &self.notifications }

    /// Registers a callback for newly downloaded remote images.
    pub fn on_download_completed<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&CurrentWallpaper) + Send + Sync + 'static {
        self.notifications.download_completed.subscribe_fn(callback)
    }

    /// Registers a callback for any change of the displayed image.
    pub fn on_wallpaper_changed<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&CurrentWallpaper) + Send + Sync + 'static {
        self.notifications.wallpaper_changed.subscribe_fn(callback)
    }

    /// Registers a callback for zoom changes.
    pub fn on_zoom_changed<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&f64) + Send + Sync + 'static {
        self.notifications.zoom_changed.subscribe_fn(callback)
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    /// Snapshot of the persisted state.
    #[must_use]
    pub fn state(&self) -> EngineState { self.shared.lock().state.clone() }

    /// Remote history, most recent first.
    #[must_use]
    pub fn history(&self) -> Vec<ImageRecord> { self.shared.lock().state.history.clone() }

    /// Favorites, refreshed from the ledger.
    #[must_use]
    pub fn favorites(&self) -> Vec<FavoriteEntry> { self.refresh_favorites().favorites.clone() }

    #[must_use]
    pub fn remote_count(&self) -> usize { self.shared.lock().state.history.len() }

    #[must_use]
    pub fn favorite_count(&self) -> usize { self.refresh_favorites().favorites.len() }

    #[must_use]
    pub fn total_count(&self) -> usize { self.refresh_favorites().sizes().total() }

    /// Current cursor, or `None` when both collections are empty.
    #[must_use]
    pub fn cursor(&self) -> Option<Cursor> { self.refresh_favorites().cursor() }

    /// What is currently displayed.
    #[must_use]
    pub fn current(&self) -> Option<CurrentWallpaper> {
        let shared = self.refresh_favorites();
        self.view(&shared)
    }

    #[must_use]
    pub fn zoom_factor(&self) -> f64 { self.shared.lock().state.zoom_factor }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Moves one step toward older items.
    pub fn next(&self) -> bool { self.navigate("next", Cursor::next) }

    /// Moves one step toward newer items.
    pub fn previous(&self) -> bool { self.navigate("previous", Cursor::previous) }

    /// Jumps to `index` within `collection`.
    pub fn goto(&self, collection: Collection, index: usize) -> bool {
        self.navigate("goto", |_, sizes| Cursor::goto(collection, index, sizes))
    }

    /// Resolves the thumbnail of an item, downloading it for remote slots.
    ///
    /// Favorites have no separate thumbnail; their image file is returned.
    #[must_use]
    pub fn thumbnail_path(&self, collection: Collection, index: usize) -> Option<PathBuf> {
        let target = {
            let shared = self.refresh_favorites();
            let cursor = Cursor::goto(collection, index, shared.sizes())?;
            shared.target(cursor)?
        };

        match target {
            Target::Remote(record) => match self.cache.ensure_thumbnail(index, &record) {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(slot = index, error = %err, "failed to fetch thumbnail");
                    None
                }
            },
            Target::Favorite(entry) => entry.file_path.is_file().then_some(entry.file_path),
        }
    }

    fn navigate<F>(&self, action: &'static str, pick: F) -> bool
    where F: FnOnce(Cursor, Sizes) -> Option<Cursor> {
        let (cursor, target) = {
            let shared = self.refresh_favorites();
            let Some(current) = shared.cursor() else {
                tracing::debug!(action, "nothing to navigate");
                return false;
            };
            let Some(cursor) = pick(current, shared.sizes()) else {
                tracing::debug!(action, cursor = %current, "no item in that direction");
                return false;
            };
            let Some(target) = shared.target(cursor) else {
                return false;
            };
            (cursor, target)
        };

        let Some(path) = self.resolve(cursor, &target) else {
            return false;
        };

        let view = {
            let mut shared = self.shared.lock();
            if !shared.target(cursor).is_some_and(|now| now.is_same(&target)) {
                drop(shared);
                tracing::info!(action, cursor = %cursor, "collection changed while navigating");
                if let Target::Remote(record) = &target
                    && let Err(err) = self.cache.discard(cursor.index, record)
                {
                    tracing::warn!(slot = cursor.index, error = %err, "failed to discard slot");
                }
                return false;
            }
            shared.set_cursor(cursor);
            self.persist(&shared.state);
            self.view(&shared)
        };
        self.apply(&path);

        tracing::info!(action, cursor = %cursor, "navigated");
        if let Some(view) = view {
            self.notifications.wallpaper_changed.publish(&view);
        }
        true
    }

    /// Local image for a navigation target, downloading remote slots first.
    fn resolve(&self, cursor: Cursor, target: &Target) -> Option<PathBuf> {
        match target {
            Target::Remote(record) => {
                if let Err(err) = self.cache.ensure_thumbnail(cursor.index, record) {
                    tracing::debug!(slot = cursor.index, error = %err, "thumbnail preload failed");
                }
                match self.cache.ensure_image(cursor.index, record) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        tracing::warn!(cursor = %cursor, error = %err, "cannot resolve image");
                        None
                    }
                }
            }
            Target::Favorite(entry) => {
                if entry.file_path.is_file() {
                    Some(entry.file_path.clone())
                } else {
                    let err = DailywallError::SourceMissing(entry.file_path.display().to_string());
                    tracing::warn!(cursor = %cursor, id = %entry.id, error = %err, "favorite file missing");
                    None
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Favorites
    // ------------------------------------------------------------------

    /// Pins the displayed image. Succeeds without change if it already is a
    /// favorite.
    pub fn add_current_to_favorites(&self) -> bool {
        let Some(current) = self.current() else {
            tracing::debug!("no current wallpaper to favorite");
            return false;
        };
        if current.collection == Collection::Favorite {
            return true;
        }

        let source = match self.cache.ensure_image(current.index, &current.record) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(error = %err, "cannot resolve current image for favorites");
                return false;
            }
        };

        match self.favorites.add(&current.record, &source) {
            Ok(entry) => {
                tracing::debug!(id = %entry.id, "current wallpaper added to favorites");
                drop(self.refresh_favorites());
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to add favorite");
                false
            }
        }
    }

    /// Removes favorite `id`.
    ///
    /// If it was being displayed the cursor moves to the next item, else the
    /// previous one, else the newest remote item. A favorite cursor behind the
    /// removed entry shifts so the same image stays selected.
    pub fn remove_favorite(&self, id: &str) -> bool {
        let (removed_at, displayed) = {
            let shared = self.refresh_favorites();
            let Some(position) = shared.favorites.iter().position(|entry| entry.id == id) else {
                tracing::debug!(id, "favorite not found");
                return false;
            };
            let displayed = shared.cursor() == Some(Cursor::new(Collection::Favorite, position));
            (position, displayed)
        };

        match self.favorites.remove(id) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                tracing::warn!(id, error = %err, "failed to remove favorite");
                return false;
            }
        }

        if displayed {
            self.move_off_removed(removed_at);
        } else {
            let mut shared = self.refresh_favorites();
            let stored = Cursor::new(shared.state.current_source, shared.state.current_index);
            let adjusted = if stored.collection == Collection::Favorite && stored.index > removed_at
            {
                Some(Cursor::new(Collection::Favorite, stored.index - 1))
            } else {
                shared.cursor()
            };
            if let Some(cursor) = adjusted
                && cursor != stored
            {
                shared.set_cursor(cursor);
                self.persist(&shared.state);
            }
        }

        true
    }

    fn move_off_removed(&self, removed_at: usize) {
        let sizes = self.refresh_favorites().sizes();
        let removed = Cursor::new(Collection::Favorite, removed_at);

        let candidates = [
            Cursor::goto(Collection::Favorite, removed_at, sizes),
            removed.previous(sizes),
            Cursor::goto(Collection::Remote, 0, sizes),
        ];
        for candidate in candidates.into_iter().flatten() {
            if self.navigate("reposition", |_, _| Some(candidate)) {
                return;
            }
        }

        let mut shared = self.shared.lock();
        let fallback = shared.cursor().unwrap_or_default();
        shared.set_cursor(fallback);
        self.persist(&shared.state);
    }

    /// Id of the displayed image if it is a favorite, by collection or by URL.
    #[must_use]
    pub fn current_favorite_id(&self) -> Option<String> { self.current()?.favorite_id }

    /// Removes the displayed image from favorites if pinned, else pins it.
    pub fn toggle_current_favorite(&self) -> bool {
        match self.current_favorite_id() {
            Some(id) => self.remove_favorite(&id),
            None => self.add_current_to_favorites(),
        }
    }

    /// Opens the favorites directory with the platform opener.
    pub fn open_favorites_folder(&self) -> bool {
        let dir = self.favorites.directory();
        if let Err(err) = fs::create_dir_all(&dir) {
            tracing::warn!(path = %dir.display(), error = %err, "cannot create favorites folder");
            return false;
        }

        match self.desktop.open_path(&dir) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "cannot open favorites folder");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Zoom
    // ------------------------------------------------------------------

    /// Stores a new zoom preference. Returns `false` for unchanged or
    /// non-positive values.
    pub fn set_zoom_factor(&self, zoom: f64) -> bool {
        if !(zoom.is_finite() && zoom > 0.0) {
            tracing::debug!(zoom, "rejected zoom factor");
            return false;
        }

        {
            let mut shared = self.shared.lock();
            if (shared.state.zoom_factor - zoom).abs() < f64::EPSILON {
                return false;
            }
            shared.state.zoom_factor = zoom;
            self.persist(&shared.state);
        }

        self.notifications.zoom_changed.publish(&zoom);
        true
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Fetches `days` records, commits them as the remote history and fills
    /// the slot cache.
    ///
    /// Slot 0 always holds the applied wallpaper: when the feed is ahead of
    /// it, the history starts at the applied record and newer ones are left
    /// to the sync loop. If the applied record is no longer in the feed,
    /// slot 0 is left untouched. Slots whose record changed are invalidated before
    /// being downloaded again. Individual download failures are logged and
    /// do not abort the refresh.
    ///
    /// # Errors
    ///
    /// Returns the feed error if the history cannot be fetched, or
    /// [`DailywallError::FeedFormat`] if the feed returned nothing.
    pub fn refresh_history(&self, days: usize) -> Result<usize> {
        let fetched = self.feed.fetch_records(0, days.max(1))?;
        if fetched.is_empty() {
            return Err(DailywallError::FeedFormat("feed returned no images".to_string()));
        }

        let (records, previous, applied_url) = {
            let mut shared = self.shared.lock();
            let applied_url = shared.state.picture_url.clone();
            let records = align_to_applied(fetched, &applied_url);
            let previous = std::mem::replace(&mut shared.state.history, records.clone());
            if let Some(cursor) = shared.cursor() {
                shared.set_cursor(cursor);
            }
            self.persist(&shared.state);
            (records, previous, applied_url)
        };
        drop(self.refresh_favorites());

        // Slot 0 keeps the applied image until a sync cycle replaces it.
        let head_pending = !applied_url.is_empty()
            && records.first().is_some_and(|head| head.picture_url != applied_url);
        let first_slot = usize::from(head_pending);
        for (slot, record) in records.iter().enumerate().skip(first_slot) {
            let owner = if slot == 0 && !applied_url.is_empty() {
                Some(applied_url.as_str())
            } else {
                previous.get(slot).map(|old| old.picture_url.as_str())
            };
            if owner != Some(record.picture_url.as_str()) {
                self.invalidate_slot(slot);
            }
        }
        for slot in records.len()..previous.len() {
            self.invalidate_slot(slot);
        }

        let mut failures = 0;
        for (slot, record) in records.iter().enumerate().skip(first_slot) {
            if let Err(err) = self.cache.ensure_cached(slot, record) {
                failures += 1;
                tracing::warn!(slot, error = %err, "failed to cache history slot");
            }
        }

        let count = records.len();
        tracing::info!(days, count, failures, "history refreshed");
        Ok(count)
    }

    /// Runs one polling cycle.
    ///
    /// A record is new when its URL differs from the applied one or the
    /// applied file is gone. New records are cached in slot 0, applied,
    /// persisted and announced; the history is refreshed when its head is
    /// stale. On the first cycle an unchanged wallpaper is applied again.
    ///
    /// # Errors
    ///
    /// Returns feed and slot-0 cache errors; the caller retries later.
    pub fn sync_once(&self, first_cycle: bool) -> Result<SyncOutcome> {
        let latest = self.feed.fetch_latest()?;

        let (applied_url, applied_path) = {
            let shared = self.shared.lock();
            (shared.state.picture_url.clone(), shared.state.picture_file_path.clone())
        };

        let url_changed = latest.picture_url != applied_url;
        if !url_changed && applied_path.is_file() {
            if first_cycle {
                self.reapply();
                return Ok(SyncOutcome::Reapplied);
            }
            return Ok(SyncOutcome::Unchanged);
        }

        tracing::info!(url = %latest.picture_url, date = %latest.date, "new wallpaper available");
        if url_changed {
            self.invalidate_slot(0);
        }
        let image = self.cache.ensure_image(0, &latest)?;
        if let Err(err) = self.cache.ensure_thumbnail(0, &latest) {
            tracing::warn!(error = %err, "failed to cache current thumbnail");
        }
        self.apply(&image);

        let history_stale = {
            let mut shared = self.shared.lock();
            shared.state.picture_url.clone_from(&latest.picture_url);
            shared.state.picture_file_path = std::path::absolute(&image).unwrap_or(image);
            shared.state.copyright.clone_from(&latest.caption);
            shared.set_cursor(Cursor::new(Collection::Remote, 0));
            self.persist(&shared.state);
            shared.state.history.first().map(|head| head.picture_url.as_str())
                != Some(latest.picture_url.as_str())
        };

        if history_stale {
            if let Err(err) = self.refresh_history(self.sync.history_days()) {
                tracing::warn!(error = %err, "history refresh after update failed");
                let mut shared = self.shared.lock();
                shared.state.history.insert(0, latest);
                self.persist(&shared.state);
            }
        }

        if let Some(view) = self.current() {
            self.notifications.wallpaper_changed.publish(&view);
            self.notifications.download_completed.publish(&view);
        }
        Ok(SyncOutcome::Updated)
    }

    /// Applies the displayed item again, falling back to slot 0.
    fn reapply(&self) {
        let view = self.current();
        let path = view
            .as_ref()
            .map(|view| view.file_path.clone())
            .filter(|path| path.is_file())
            .unwrap_or_else(|| self.cache.image_path(0));

        tracing::debug!(path = %path.display(), "re-applying known wallpaper");
        self.apply(&path);
        if let Some(view) = view {
            self.notifications.wallpaper_changed.publish(&view);
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Reloads the favorites snapshot from the ledger and returns the locked
    /// shared state.
    fn refresh_favorites(&self) -> MutexGuard<'_, Shared> {
        let snapshot = self.favorites.list();
        let mut shared = self.shared.lock();
        shared.favorites = snapshot;
        shared
    }

    fn view(&self, shared: &Shared) -> Option<CurrentWallpaper> {
        let cursor = shared.cursor()?;
        let total = shared.sizes().len(cursor.collection);

        let view = match shared.target(cursor)? {
            Target::Remote(record) => CurrentWallpaper {
                favorite_id: find_by_picture_url(&shared.favorites, &record.picture_url)
                    .map(|entry| entry.id.clone()),
                file_path: self.cache.image_path(cursor.index),
                record,
                collection: cursor.collection,
                index: cursor.index,
                total,
            },
            Target::Favorite(entry) => CurrentWallpaper {
                favorite_id: Some(entry.id),
                file_path: entry.file_path,
                record: entry.record,
                collection: cursor.collection,
                index: cursor.index,
                total,
            },
        };
        Some(view)
    }

    fn apply(&self, path: &Path) {
        if let Err(err) = self.desktop.apply_background(path) {
            tracing::warn!(path = %path.display(), error = %err, "failed to apply wallpaper");
        }
    }

    fn persist(&self, state: &EngineState) {
        if let Err(err) = self.state_store.save(state) {
            tracing::warn!(error = %err, "state not persisted, keeping in-memory copy");
        }
    }

    fn invalidate_slot(&self, slot: usize) {
        if let Err(err) = self.cache.invalidate(slot) {
            tracing::warn!(slot, error = %err, "failed to invalidate slot");
        }
    }
}

/// Drops feed records newer than the applied one so the history head is the
/// image in slot 0.
fn align_to_applied(mut records: Vec<ImageRecord>, applied_url: &str) -> Vec<ImageRecord> {
    match records.iter().position(|record| record.picture_url == applied_url) {
        Some(pending) if pending > 0 => {
            tracing::debug!(pending, "feed is ahead of the applied wallpaper");
            records.split_off(pending)
        }
        _ => records,
    }
}
