//! Error types for brokersite.
//!
//! Library crates use [`BrokerSiteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all brokersite operations.
///
/// Every variant renders to a human-readable message; that string is what the
/// content store and contact submitter surface to their consumers.
#[derive(Debug, thiserror::Error)]
pub enum BrokerSiteError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure (DNS, connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success HTTP status.
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// The API answered 2xx but reported a failure in its envelope.
    #[error("{message}")]
    Api { message: String },

    /// JSON decoding error (response body or cached feed).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (form fields, unknown icon keys, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// An operation of the same kind is already in flight.
    #[error("{0} already in progress")]
    Busy(&'static str),

    /// The operation was cancelled before it committed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BrokerSiteError>;

impl BrokerSiteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an API-level error from the envelope message.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the network or the remote API.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Http { .. } | Self::Api { .. }
        )
    }
}
