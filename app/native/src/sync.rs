//! Background polling loop.
//!
//! [`SyncLoop::start`] spawns two named threads: a one-shot warm-up that
//! fills the history cache, and the loop itself, which runs
//! [`Engine::sync_once`] immediately and then every `checkInterval`. A failed
//! cycle is retried after `retryInterval`, doubling on consecutive failures
//! up to `checkInterval`.
//!
//! Sleeps are interruptible, so [`SyncLoop::stop`] returns as soon as the
//! current cycle finishes, bounded by `shutdownTimeoutMs`. A warm-up still
//! downloading at that point is detached and finishes on its own.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::engine::{Engine, SyncOutcome};
use crate::platform::spawn_named_thread;

/// Stop flag the loop sleeps on.
#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.condvar.notify_all();
    }

    fn is_stopped(&self) -> bool { *self.stopped.lock() }

    /// Sleeps for `duration` or until stopped. Returns `true` if stopped.
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.condvar.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// Delay before the next attempt after `failures` consecutive failures.
#[must_use]
pub fn retry_delay(retry_interval: Duration, check_interval: Duration, failures: u32) -> Duration {
    let factor = 1u32 << failures.saturating_sub(1).min(16);
    retry_interval.saturating_mul(factor).min(check_interval.max(retry_interval))
}

/// Handle to the running background loop.
pub struct SyncLoop {
    signal: Arc<StopSignal>,
    done: Option<Receiver<()>>,
    handle: Option<JoinHandle<()>>,
    warmup: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl SyncLoop {
    /// Starts the warm-up and polling threads.
    #[must_use]
    pub fn start(engine: &Arc<Engine>) -> Self {
        let signal = Arc::new(StopSignal::default());
        let shutdown_timeout = engine.sync_config().shutdown_timeout();

        let warm = Arc::clone(engine);
        let warmup = spawn_named_thread("warmup", move || {
            let days = warm.sync_config().history_days();
            if let Err(err) = warm.refresh_history(days) {
                tracing::warn!(error = %err, "history warm-up failed");
            }
        });

        let (tx, rx) = mpsc::channel();
        let looping = Arc::clone(engine);
        let loop_signal = Arc::clone(&signal);
        let handle = spawn_named_thread("sync", move || {
            run(&looping, &loop_signal);
            let _ = tx.send(());
        });

        tracing::info!("sync loop started");
        Self { signal, done: handle.as_ref().map(|_| rx), handle, warmup, shutdown_timeout }
    }

    /// Whether the one-shot history warm-up is still running.
    #[must_use]
    pub fn is_warming_up(&self) -> bool {
        self.warmup.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Whether the loop thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Signals the loop to stop and waits up to the shutdown timeout.
    ///
    /// Returns `true` if the thread exited in time. On timeout the thread is
    /// detached and finishes its current cycle on its own.
    pub fn stop(&mut self) -> bool {
        self.signal.stop();
        self.release_warmup();
        let (Some(done), Some(handle)) = (self.done.take(), self.handle.take()) else {
            return true;
        };

        match done.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    tracing::error!("sync thread panicked");
                }
                tracing::info!("sync loop stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.shutdown_timeout.as_millis(),
                    "sync loop did not stop in time, detaching"
                );
                false
            }
        }
    }
}

impl SyncLoop {
    fn release_warmup(&mut self) {
        let Some(warmup) = self.warmup.take() else {
            return;
        };
        if !warmup.is_finished() {
            tracing::info!("history warm-up still running, detaching");
        } else if warmup.join().is_err() {
            tracing::error!("warm-up thread panicked");
        }
    }
}

impl Drop for SyncLoop {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

fn run(engine: &Engine, signal: &StopSignal) {
    let sync = engine.sync_config();
    let mut first_cycle = true;
    let mut failures = 0u32;

    while !signal.is_stopped() {
        let delay = match engine.sync_once(first_cycle) {
            Ok(outcome) => {
                first_cycle = false;
                failures = 0;
                if outcome != SyncOutcome::Unchanged {
                    tracing::debug!(?outcome, "sync cycle finished");
                }
                sync.check_interval()
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                let delay = retry_delay(sync.retry_interval(), sync.check_interval(), failures);
                if err.is_transient() {
                    tracing::warn!(
                        error = %err,
                        failures,
                        retry_in_secs = delay.as_secs(),
                        "sync cycle failed"
                    );
                } else {
                    tracing::error!(error = %err, failures, "sync cycle failed unexpectedly");
                }
                delay
            }
        };

        if signal.wait(delay) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::cache::DataPaths;
    use crate::config::DailywallConfig;
    use crate::test_utils::{FakeTransport, RecordingDesktop};

    fn engine(
        dir: &TempDir,
        transport: &Arc<FakeTransport>,
        desktop: &Arc<RecordingDesktop>,
    ) -> Arc<Engine> {
        Arc::new(Engine::new(
            &DailywallConfig::default(),
            DataPaths::new(dir.path()),
            transport.clone(),
            desktop.clone(),
        ))
    }

    fn wait_for(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_retry_delay_doubles_up_to_check_interval() {
        let retry = Duration::from_secs(60);
        let check = Duration::from_secs(300);

        assert_eq!(retry_delay(retry, check, 1), Duration::from_secs(60));
        assert_eq!(retry_delay(retry, check, 2), Duration::from_secs(120));
        assert_eq!(retry_delay(retry, check, 3), Duration::from_secs(240));
        assert_eq!(retry_delay(retry, check, 4), check);
        assert_eq!(retry_delay(retry, check, u32::MAX), check);
    }

    #[test]
    fn test_wait_returns_early_when_stopped() {
        let signal = Arc::new(StopSignal::default());
        let stopper = Arc::clone(&signal);
        let started = Instant::now();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stopper.stop();
        });

        assert!(signal.wait(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_times_out() {
        let signal = StopSignal::default();
        assert!(!signal.wait(Duration::from_millis(10)));
    }

    #[test]
    fn test_loop_applies_first_image_and_stops_promptly() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let desktop = Arc::new(RecordingDesktop::default());
        transport.set_feed(&[("/th?id=A", "20250409"), ("/th?id=B", "20250408")]);
        let engine = engine(&dir, &transport, &desktop);

        let mut sync = SyncLoop::start(&engine);
        assert!(wait_for(|| !desktop.applied().is_empty()));
        assert!(sync.is_running());

        let started = Instant::now();
        assert!(sync.stop());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!sync.is_running());
        assert_eq!(engine.state().current_index, 0);
    }

    #[test]
    fn test_loop_survives_feed_outage() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let desktop = Arc::new(RecordingDesktop::default());
        let engine = engine(&dir, &transport, &desktop);

        let mut sync = SyncLoop::start(&engine);
        assert!(wait_for(|| transport.feed_requests() >= 1));
        assert!(sync.is_running());

        assert!(sync.stop());
        assert!(desktop.applied().is_empty());
    }

    #[test]
    fn test_warmup_is_tracked_until_it_finishes() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let desktop = Arc::new(RecordingDesktop::default());
        transport.set_feed(&[("/th?id=A", "20250409"), ("/th?id=B", "20250408")]);
        let engine = engine(&dir, &transport, &desktop);

        let mut sync = SyncLoop::start(&engine);
        assert!(wait_for(|| !sync.is_warming_up()));
        assert_eq!(engine.remote_count(), 2);

        assert!(sync.stop());
        assert!(!sync.is_warming_up());
    }

    #[test]
    fn test_stop_detaches_a_stalled_warmup() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let desktop = Arc::new(RecordingDesktop::default());
        transport.set_feed(&[("/th?id=A", "20250409"), ("/th?id=B", "20250408")]);
        let (entered, release) =
            transport.hold_download("https://www.bing.com/th?id=B_320x240.jpg");
        let engine = engine(&dir, &transport, &desktop);

        let mut sync = SyncLoop::start(&engine);
        entered.recv().unwrap();

        let started = Instant::now();
        sync.stop();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!sync.is_warming_up(), "handle is released at stop");

        release.send(()).unwrap();
    }

    #[test]
    fn test_stop_twice() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let desktop = Arc::new(RecordingDesktop::default());
        let mut sync = SyncLoop::start(&engine(&dir, &transport, &desktop));

        assert!(sync.stop());
        assert!(sync.stop());
    }
}
