//! Engine state persistence.
//!
//! `load` never fails: a missing file yields defaults and a corrupt one is
//! logged and treated as "no prior state". `save` reports failures so the
//! caller can keep its in-memory copy authoritative until the next save.

use std::fs;
use std::path::PathBuf;

use super::fs::write_json_atomic;
use crate::error::{DailywallError, Result};
use crate::model::EngineState;

/// Reads and writes `state.json`.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    default_zoom: f64,
}

impl StateStore {
    #[must_use]
    pub const fn new(path: PathBuf, default_zoom: f64) -> Self { Self { path, default_zoom } }

    /// State used when nothing usable is on disk.
    #[must_use]
    pub fn fresh(&self) -> EngineState {
        EngineState { zoom_factor: self.default_zoom, ..EngineState::default() }
    }

    /// Loads the persisted state, falling back to defaults.
    #[must_use]
    pub fn load(&self) -> EngineState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no saved state, starting fresh");
                return self.fresh();
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read state");
                return self.fresh();
            }
        };

        match serde_json::from_str::<EngineState>(&content) {
            Ok(mut state) => {
                if !(state.zoom_factor.is_finite() && state.zoom_factor > 0.0) {
                    state.zoom_factor = self.default_zoom;
                }
                state
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "state file is corrupt, ignoring it"
                );
                self.fresh()
            }
        }
    }

    /// Writes `state` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`DailywallError::Persistence`] if the file cannot be written.
    pub fn save(&self, state: &EngineState) -> Result<()> {
        write_json_atomic(&self.path, state).map_err(|err| {
            DailywallError::Persistence(format!("failed to write {}: {err}", self.path.display()))
        })
    }
}
