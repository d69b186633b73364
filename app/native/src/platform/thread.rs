use std::thread::{self, JoinHandle};

use crate::constants::APP_NAME;

/// Spawns a background thread named `dailywall-{name}`.
///
/// Returns `None` (after logging) when the OS refuses to create the thread.
pub fn spawn_named_thread<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = format!("{APP_NAME}-{name}");

    match thread::Builder::new().name(thread_name.clone()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
            None
        }
    }
}
