//! Media operation errors.

use mediabase_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Media operation errors.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Content type not in the allow-list. Raised before any backend call.
    #[error("content type '{content_type}' is not allowed")]
    InvalidContentType {
        /// The rejected content type.
        content_type: String,
    },

    /// Requested size above the server ceiling. Raised before any backend call.
    #[error("requested max file size {requested} bytes exceeds server maximum {max} bytes")]
    SizeExceeded {
        /// Requested maximum size.
        requested: u64,
        /// Server ceiling.
        max: u64,
    },

    /// Path or file name would escape the caller's prefix.
    #[error("invalid object key: {reason}")]
    InvalidObjectKey {
        /// Why the key was rejected.
        reason: String,
    },

    /// Download requested for an object that does not exist.
    #[error("object '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },

    /// A backend call failed. Not retried here.
    #[error("{operation} failed for {}: {source}", describe_target(.bucket, .key.as_deref()))]
    BackendUnavailable {
        /// Backend operation name.
        operation: &'static str,
        /// Bucket name.
        bucket: String,
        /// Object key, when the operation targets one.
        key: Option<String>,
        /// Underlying backend error.
        #[source]
        source: StorageError,
    },

    /// Bucket exists but the public-read policy was not applied.
    ///
    /// Retry the policy step, not the bucket creation.
    #[error("bucket '{bucket}' exists but its access policy could not be applied: {source}")]
    PolicyApplicationFailed {
        /// Bucket name.
        bucket: String,
        /// Underlying backend error.
        #[source]
        source: StorageError,
    },
}

impl MediaError {
    /// Create an invalid content type error.
    #[must_use]
    pub fn invalid_content_type(content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            content_type: content_type.into(),
        }
    }

    /// Create a size exceeded error.
    #[must_use]
    pub fn size_exceeded(requested: u64, max: u64) -> Self {
        Self::SizeExceeded { requested, max }
    }

    /// Create an invalid object key error.
    #[must_use]
    pub fn invalid_object_key(reason: impl Into<String>) -> Self {
        Self::InvalidObjectKey {
            reason: reason.into(),
        }
    }

    /// Create an object not found error.
    #[must_use]
    pub fn object_not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Wrap a backend failure with the call that produced it.
    #[must_use]
    pub fn backend(
        operation: &'static str,
        bucket: impl Into<String>,
        key: Option<&str>,
        source: StorageError,
    ) -> Self {
        Self::BackendUnavailable {
            operation,
            bucket: bucket.into(),
            key: key.map(String::from),
            source,
        }
    }
}

fn describe_target(bucket: &str, key: Option<&str>) -> String {
    match key {
        Some(key) => format!("object '{key}' in bucket '{bucket}'"),
        None => format!("bucket '{bucket}'"),
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match err {
            MediaError::InvalidContentType { .. } => Self::InvalidContentType(message),
            MediaError::SizeExceeded { .. } => Self::SizeExceeded(message),
            MediaError::InvalidObjectKey { .. } => Self::Validation(message),
            MediaError::ObjectNotFound { .. } => Self::NotFound(message),
            MediaError::BackendUnavailable { .. } => Self::BackendUnavailable(message),
            MediaError::PolicyApplicationFailed { .. } => Self::PolicyApplicationFailed(message),
        }
    }
}
