//! Error types for the terror zone notifier
//!
//! This module defines all error types used throughout the crate.
//! None of them terminate the scheduler: every error is logged and the
//! watcher returns to its next sleep point.

use thiserror::Error;

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the terror zone notifier
#[derive(Error, Debug)]
pub enum Error {
    /// Upstream zone API failed (transport, status, or body)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A webhook sink rejected or failed to receive a notification
    #[error("Notify error ({sink}): {message}")]
    Notify {
        /// Sink name
        sink: String,
        /// Error message
        message: String,
    },

    /// State file could not be read or written
    #[error("Persist error: {0}")]
    Persist(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Upstream answered with something we cannot turn into a zone pair
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a notify error for a named sink
    pub fn notify(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a persist error
    pub fn persist(msg: impl Into<String>) -> Self {
        Self::Persist(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether this error came from the upstream fetch path
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::InvalidResponse(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_names_sink() {
        let err = Error::notify("discord", "status 500");
        assert_eq!(err.to_string(), "Notify error (discord): status 500");
    }

    #[test]
    fn test_fetch_classification() {
        assert!(Error::fetch("timeout").is_fetch());
        assert!(Error::invalid_response("no current").is_fetch());
        assert!(!Error::persist("disk full").is_fetch());
    }
}
