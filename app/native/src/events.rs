//! In-process notification bus.
//!
//! Three independent channels are exposed through [`Notifications`]:
//!
//! - `download_completed` - a new remote image was cached and applied
//! - `wallpaper_changed` - the displayed image changed (any cause)
//! - `zoom_changed` - the zoom preference changed
//!
//! Subscribers run synchronously on the publishing thread in registration
//! order. A subscriber that returns an error or panics is logged and the
//! remaining subscribers still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::model::CurrentWallpaper;

/// Event names, used as the `event` field in logs.
pub mod names {
    /// Payload: [`CurrentWallpaper`](crate::model::CurrentWallpaper) of the new slot-0 image.
    pub const DOWNLOAD_COMPLETED: &str = "download-completed";

    /// Payload: [`CurrentWallpaper`](crate::model::CurrentWallpaper) now displayed.
    pub const WALLPAPER_CHANGED: &str = "wallpaper-changed";

    /// Payload: `f64` - the new zoom factor.
    pub const ZOOM_CHANGED: &str = "zoom-changed";
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Error a subscriber may return to signal it could not handle an event.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

type Callback<T> = Arc<dyn Fn(&T) -> Result<(), SubscriberError> + Send + Sync>;

/// Ordered list of subscribers for one event type.
pub struct EventBus<T> {
    name: &'static str,
    subscribers: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> EventBus<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, subscribers: Mutex::new(Vec::new()) }
    }

    /// Registers a fallible callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&T) -> Result<(), SubscriberError> + Send + Sync + 'static {
        let id = SubscriptionId(Uuid::now_v7());
        self.subscribers.lock().push((id, Arc::new(callback)));
        tracing::debug!(event = self.name, subscription = %id, "subscriber registered");
        id
    }

    /// Registers a callback that cannot fail.
    pub fn subscribe_fn<F>(&self, callback: F) -> SubscriptionId
    where F: Fn(&T) + Send + Sync + 'static {
        self.subscribe(move |payload| {
            callback(payload);
            Ok(())
        })
    }

    /// Removes a subscriber. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        before != subscribers.len()
    }

    #[must_use]
    pub fn len(&self) -> usize { self.subscribers.lock().len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.subscribers.lock().is_empty() }

    /// Delivers `payload` to every subscriber.
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe
    /// or unsubscribe without deadlocking. Returns how many callbacks failed.
    pub fn publish(&self, payload: &T) -> usize {
        let snapshot: Vec<(SubscriptionId, Callback<T>)> = self.subscribers.lock().clone();
        let mut failures = 0;

        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    failures += 1;
                    tracing::warn!(
                        event = self.name,
                        subscription = %id,
                        error = %err,
                        "subscriber failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    tracing::error!(event = self.name, subscription = %id, "subscriber panicked");
                }
            }
        }

        failures
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("subscribers", &self.len())
            .finish()
    }
}

/// The engine's three notification channels.
#[derive(Debug)]
pub struct Notifications {
    pub download_completed: EventBus<CurrentWallpaper>,
    pub wallpaper_changed: EventBus<CurrentWallpaper>,
    pub zoom_changed: EventBus<f64>,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            download_completed: EventBus::new(names::DOWNLOAD_COMPLETED),
            wallpaper_changed: EventBus::new(names::WALLPAPER_CHANGED),
            zoom_changed: EventBus::new(names::ZOOM_CHANGED),
        }
    }
}
