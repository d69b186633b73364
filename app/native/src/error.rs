//! Error types for Dailywall.
//!
//! This module provides the unified error type used throughout the engine and
//! the CLI. Variants mirror the failure categories the engine distinguishes:
//! transient feed failures, missing sources, persistence and cache writes.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during application execution.
///
/// The enum serializes as `{ "kind": ..., "message": ... }` so it can be
/// emitted verbatim by `--json` style CLI output.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum DailywallError {
    /// The feed could not be reached (network or transport failure).
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),
    /// The feed answered with a document that could not be parsed.
    #[error("Feed format error: {0}")]
    FeedFormat(String),
    /// A file that an operation copies from does not exist.
    #[error("Source missing: {0}")]
    SourceMissing(String),
    /// State or ledger could not be written durably.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// An image or thumbnail could not be written to the cache.
    #[error("Cache write error: {0}")]
    CacheWrite(String),
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl DailywallError {
    /// Returns whether the error is transient and worth retrying later.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FeedUnavailable(_) | Self::FeedFormat(_) | Self::CacheWrite(_)
        )
    }
}

impl From<std::io::Error> for DailywallError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for DailywallError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<String> for DailywallError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for DailywallError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

/// Convenience alias used across the crate.
pub type Result<T, E = DailywallError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_unavailable_display() {
        let err = DailywallError::FeedUnavailable("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Feed unavailable"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_feed_format_display() {
        let err = DailywallError::FeedFormat("missing urlBase".to_string());
        assert!(err.to_string().contains("Feed format error"));
    }

    #[test]
    fn test_source_missing_display() {
        let err = DailywallError::SourceMissing("/tmp/current.jpg".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Source missing"));
        assert!(msg.contains("/tmp/current.jpg"));
    }

    #[test]
    fn test_persistence_display() {
        let err = DailywallError::Persistence("disk full".to_string());
        assert!(err.to_string().contains("Persistence error"));
    }

    #[test]
    fn test_cache_write_display() {
        let err = DailywallError::CacheWrite("truncated body".to_string());
        assert!(err.to_string().contains("Cache write error"));
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: DailywallError = io_err.into();
        assert!(matches!(err, DailywallError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_command_error_display() {
        let err = DailywallError::CommandError("Generic failure".to_string());
        assert_eq!(err.to_string(), "Generic failure");
    }

    #[test]
    fn test_from_string() {
        let err: DailywallError = "test error".into();
        assert!(matches!(err, DailywallError::CommandError(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(DailywallError::FeedUnavailable(String::new()).is_transient());
        assert!(DailywallError::FeedFormat(String::new()).is_transient());
        assert!(DailywallError::CacheWrite(String::new()).is_transient());
        assert!(!DailywallError::Persistence(String::new()).is_transient());
        assert!(!DailywallError::SourceMissing(String::new()).is_transient());
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = DailywallError::SourceMissing("gone.jpg".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("SourceMissing"));
        assert!(json.contains("gone.jpg"));
    }
}
