//! Storage error types.

use std::time::Duration;

use thiserror::Error;

/// Storage backend errors.
///
/// These never leave the storage layer untranslated: the media service wraps
/// them with the operation, bucket and key that produced them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object or bucket not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Network or TLS failure talking to the backend.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with an error response.
    #[error("backend rejected request with status {status} ({code}): {message}")]
    Rejected {
        /// HTTP status returned by the backend.
        status: u16,
        /// Backend error code, e.g. `AccessDenied`.
        code: String,
        /// Backend error message.
        message: String,
    },

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Backend call did not finish within the allowed time.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a rejection error from a backend response.
    #[must_use]
    pub fn rejected(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the target does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Rejected { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
