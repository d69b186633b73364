//! Command-line interface for Dailywall.
//!
//! Every command loads the persisted state from the data directory, so
//! one-shot commands and a running `dailywall run` daemon see the same
//! history, favorites and cursor.

mod commands;
mod output;

pub use commands::{CacheCommands, Cli, Commands, ConfigCommands, FavoriteCommands};
