//! Core error types for reviewbell-core.
//!
//! The decision engine itself is total and never raises errors -- fetch
//! failures travel as data inside a `Snapshot`. `CoreError` covers the
//! plumbing around it: the HTTP client, the host adapter, persistence.

use thiserror::Error;

/// Core error type for reviewbell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The host adapter could not perform a callback. Only a failed
    /// `schedule_wakeup` is surfaced this way; visibility changes are
    /// absorbed and retried on the next cycle.
    #[error("Host adapter error: {0}")]
    Host(String),

    /// HTTP client construction/configuration errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
