//! Durable stores: atomic file writes, the remote slot cache, the favorites
//! ledger and the engine state file.

pub mod cache;
pub mod favorites;
pub mod fs;
pub mod state;

pub use cache::{CachedSlot, ImageCache};
pub use favorites::FavoritesStore;
pub use state::StateStore;
