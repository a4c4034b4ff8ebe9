//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or incomplete request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content type outside the configured allow-list.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Requested size above the server ceiling.
    #[error("Size exceeded: {0}")]
    SizeExceeded(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend call failed.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Bucket exists but its access policy could not be applied.
    #[error("Policy application failed: {0}")]
    PolicyApplicationFailed(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::InvalidContentType(_) | Self::SizeExceeded(_) => 400,
            Self::NotFound(_) => 404,
            Self::PolicyApplicationFailed(_) => 502,
            Self::BackendUnavailable(_) => 503,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidContentType(_) => "INVALID_CONTENT_TYPE",
            Self::SizeExceeded(_) => "SIZE_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::PolicyApplicationFailed(_) => "POLICY_APPLICATION_FAILED",
        }
    }
}
