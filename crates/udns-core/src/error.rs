//! Error types for the UltraDNS synchronization core
//!
//! Every fallible operation in the workspace returns [`Error`]. Remote failures
//! carry the HTTP status when the service answered, which is what the retry
//! policy keys on.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// The remote service answered with a failure
    #[error("Remote error{}: {message}", status_suffix(.status))]
    Remote {
        /// HTTP status, when the service produced one
        status: Option<u16>,
        /// Error message
        message: String,
    },

    /// The call never produced a response (connect, timeout, decode)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Existence check before UPDATE/DELETE found nothing
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Desired state rejected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the pass
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline passed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl Error {
    /// Create a remote error with an HTTP status
    pub fn remote(status: u16, msg: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a remote error without a status
    pub fn remote_unknown(msg: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(msg: impl Into<String>) -> Self {
        Self::RecordNotFound(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// HTTP status attached to this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Server-side failures (status >= 500) are the only retryable kind
    pub fn is_transient(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }
}
