//! Dailywall - keeps the desktop background in sync with a daily image feed.
//!
//! The library holds the synchronization engine and the CLI built on top of
//! it. The engine polls the feed, caches recent images in numbered slots,
//! applies the newest one, and lets the user walk back through the history
//! and into a durable favorites collection.

// Core modules
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod model;
pub mod schema;

// Engine
pub mod engine;
pub mod events;
pub mod feed;
pub mod http;
pub mod navigation;
pub mod store;
pub mod sync;

// Surfaces
pub mod cli;
pub mod platform;

#[cfg(test)]
mod test_utils;

pub use engine::{Engine, SyncOutcome};
pub use error::{DailywallError, Result};
pub use sync::SyncLoop;
