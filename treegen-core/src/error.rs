//! Structured error types for treegen-core.
//!
//! Uses `thiserror` so library consumers get composable errors.
//! The `treegen` binary wraps these in `anyhow` with extra context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for treegen-core operations
#[derive(Error, Debug)]
pub enum GalleryError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// The event stream request could not be sent or the body failed mid-stream
    #[cfg(feature = "rt")]
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The event stream endpoint answered with a non-success status
    #[error("event stream at {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The endpoint answered, but not with `text/event-stream`
    #[error("event stream at {url} has content type '{content_type}', expected text/event-stream")]
    ContentType { url: String, content_type: String },

    /// Configuration file could not be parsed
    #[error("Invalid TOML in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for treegen-core operations
pub type Result<T> = std::result::Result<T, GalleryError>;

impl GalleryError {
    /// Create a bad status error
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Create a wrong content type error
    pub fn content_type(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::ContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Create a TOML parse error
    pub fn toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Toml {
            path: path.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
