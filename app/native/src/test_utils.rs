//! Shared fakes for unit tests.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::config::FeedConfig;
use crate::http::{Transport, TransportError};
use crate::model::{Collection, ImageRecord};
use crate::platform::{Desktop, DesktopError};

/// Renders a feed document with one `<image>` per `(urlBase, startdate)`.
pub fn feed_xml(entries: &[(&str, &str)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\" ?><images>");
    for (url_base, date) in entries {
        xml.push_str(&format!(
            "<image><startdate>{date}</startdate><urlBase>{}</urlBase>\
             <copyright>Caption of {}</copyright></image>",
            url_base.replace('&', "&amp;"),
            url_base.replace('&', "&amp;"),
        ));
    }
    xml.push_str("</images>");
    xml
}

/// Builds the record the feed client would produce for `url_base`.
pub fn remote_record(url_base: &str, day: u32) -> ImageRecord {
    let config = FeedConfig::default();
    ImageRecord {
        picture_url: format!("{}{url_base}{}", config.host, config.image_suffix),
        thumbnail_url: format!("{}{url_base}{}", config.host, config.thumbnail_suffix),
        caption: format!("Caption of {url_base}"),
        date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
        source: Collection::Remote,
    }
}

fn query_param(url: &str, key: &str) -> Option<usize> {
    let prefix = format!("{key}=");
    url.split_once('?')?
        .1
        .split('&')
        .find_map(|pair| pair.strip_prefix(prefix.as_str())?.parse().ok())
}

/// Holds one download until released.
struct DownloadGate {
    url: String,
    entered: Sender<()>,
    release: Receiver<()>,
}

/// In-memory transport that counts every request.
///
/// The feed fails until [`set_feed`](Self::set_feed) is called. Downloads
/// return the URL bytes as body unless failures are switched on.
#[derive(Default)]
pub struct FakeTransport {
    feed: Mutex<Option<Vec<(String, String)>>>,
    feed_requests: AtomicUsize,
    downloads: Mutex<HashMap<String, usize>>,
    fail_downloads: AtomicBool,
    fail_mid_transfer: AtomicBool,
    gate: Mutex<Option<DownloadGate>>,
}

impl FakeTransport {
    /// Serves `entries` (most recent first) as the feed.
    pub fn set_feed(&self, entries: &[(&str, &str)]) {
        let owned = entries.iter().map(|(u, d)| ((*u).to_string(), (*d).to_string())).collect();
        *self.feed.lock() = Some(owned);
    }

    /// Makes every feed request fail.
    pub fn clear_feed(&self) { *self.feed.lock() = None; }

    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Downloads write half of the body, then fail.
    pub fn set_fail_mid_transfer(&self, fail: bool) {
        self.fail_mid_transfer.store(fail, Ordering::SeqCst);
    }

    /// Makes the next download of `url` block until the returned sender
    /// fires. The returned receiver gets a message once that download has
    /// started.
    pub fn hold_download(&self, url: &str) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock() =
            Some(DownloadGate { url: url.to_string(), entered: entered_tx, release: release_rx });
        (entered_rx, release_tx)
    }

    pub fn feed_requests(&self) -> usize { self.feed_requests.load(Ordering::SeqCst) }

    /// Total number of download attempts.
    pub fn download_count(&self) -> usize { self.downloads.lock().values().sum() }

    /// Number of download attempts for one URL.
    pub fn downloads_of(&self, url: &str) -> usize {
        self.downloads.lock().get(url).copied().unwrap_or(0)
    }
}

impl Transport for FakeTransport {
    fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        self.feed_requests.fetch_add(1, Ordering::SeqCst);
        let feed = self.feed.lock().clone().ok_or_else(|| TransportError::Request {
            url: url.to_string(),
            message: "feed offline".to_string(),
        })?;

        let offset = query_param(url, "idx").unwrap_or(0);
        let count = query_param(url, "n").unwrap_or(1);
        let window: Vec<(&str, &str)> = feed
            .iter()
            .skip(offset)
            .take(count)
            .map(|(u, d)| (u.as_str(), d.as_str()))
            .collect();
        Ok(feed_xml(&window))
    }

    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        *self.downloads.lock().entry(url.to_string()).or_insert(0) += 1;

        let gate = {
            let mut gate = self.gate.lock();
            if gate.as_ref().is_some_and(|gate| gate.url == url) { gate.take() } else { None }
        };
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }

        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(TransportError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        let body = url.as_bytes();
        let transfer_error = |err: std::io::Error| TransportError::Transfer {
            url: url.to_string(),
            message: err.to_string(),
        };

        if self.fail_mid_transfer.load(Ordering::SeqCst) {
            sink.write_all(&body[..body.len() / 2]).map_err(transfer_error)?;
            return Err(TransportError::Transfer {
                url: url.to_string(),
                message: "connection reset".to_string(),
            });
        }

        sink.write_all(body).map_err(transfer_error)?;
        Ok(body.len() as u64)
    }
}

/// Desktop fake recording every call.
#[derive(Default)]
pub struct RecordingDesktop {
    applied: Mutex<Vec<PathBuf>>,
    opened: Mutex<Vec<PathBuf>>,
    fail_apply: AtomicBool,
}

impl RecordingDesktop {
    pub fn applied(&self) -> Vec<PathBuf> { self.applied.lock().clone() }

    pub fn opened(&self) -> Vec<PathBuf> { self.opened.lock().clone() }

    pub fn set_fail_apply(&self, fail: bool) { self.fail_apply.store(fail, Ordering::SeqCst); }
}

impl Desktop for RecordingDesktop {
    fn apply_background(&self, path: &Path) -> Result<(), DesktopError> {
        self.applied.lock().push(path.to_path_buf());
        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(DesktopError::SetWallpaperFailed("no display".to_string()));
        }
        Ok(())
    }

    fn open_path(&self, path: &Path) -> Result<(), DesktopError> {
        self.opened.lock().push(path.to_path_buf());
        Ok(())
    }
}
