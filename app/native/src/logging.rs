//! Process-wide log subscriber.
//!
//! Installed explicitly from `main`; library code only emits `tracing`
//! events and never initializes a subscriber on first use.

use tracing_subscriber::EnvFilter;

use crate::constants::APP_NAME;

/// Returns the filter used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{APP_NAME}={level},{APP_NAME}_lib={level}")
}

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `verbose`. Calling this more than once
/// is a no-op.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}
