//! HTTP transport used by the feed client and the image cache.
//!
//! The engine only talks to the network through [`Transport`], so tests can
//! substitute an in-memory implementation and count requests.

use std::io::{Read, Write};
use std::time::Duration;

use reqwest::blocking::Client;

use crate::constants::{DOWNLOAD_CHUNK_SIZE, USER_AGENT};

/// Errors produced by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection, TLS, timeout or non-success status.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    /// The response body could not be read or written to the sink.
    #[error("transfer from {url} failed: {message}")]
    Transfer { url: String, message: String },
}

/// Minimal blocking HTTP capability.
pub trait Transport: Send + Sync {
    /// Fetches a URL and returns the body as text.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] on network failure or a non-2xx status.
    fn fetch_text(&self, url: &str) -> Result<String, TransportError>;

    /// Streams a URL into `sink` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] when the request fails and
    /// [`TransportError::Transfer`] when the body cannot be copied.
    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(timeout).build().map_err(
            |err| TransportError::Request {
                url: String::new(),
                message: err.to_string(),
            },
        )?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, TransportError> {
        let request_error = |err: reqwest::Error| TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        };
        self.client
            .get(url)
            .send()
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)
    }
}

impl Transport for HttpTransport {
    fn fetch_text(&self, url: &str) -> Result<String, TransportError> {
        tracing::debug!(url, "fetching text");
        self.get(url)?.text().map_err(|err| TransportError::Transfer {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn fetch_to(&self, url: &str, sink: &mut dyn Write) -> Result<u64, TransportError> {
        tracing::debug!(url, "streaming download");
        let mut response = self.get(url)?;
        let transfer_error = |err: std::io::Error| TransportError::Transfer {
            url: url.to_string(),
            message: err.to_string(),
        };

        let mut chunk = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = response.read(&mut chunk).map_err(transfer_error)?;
            if read == 0 {
                break;
            }
            sink.write_all(&chunk[..read]).map_err(transfer_error)?;
            written += read as u64;
        }
        sink.flush().map_err(transfer_error)?;

        Ok(written)
    }
}
