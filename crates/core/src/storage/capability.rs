//! The contract every object-store backend satisfies.

use std::time::Duration;

use async_trait::async_trait;

use super::error::StorageError;
use super::form::FormFields;

/// Browser-POST upload authorization issued by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedPost {
    /// URL the multipart form is posted to.
    pub url: String,
    /// Signed fields the client submits verbatim, before the file part.
    pub form_data: FormFields,
}

/// Object storage capability.
///
/// Implementations hold their own credentials and connections and must be
/// safe for concurrent use. Callers never see backend-specific types.
///
/// Every method performs network I/O. Dropping the returned future aborts
/// the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Issue a POST policy for uploading `key` into `bucket`.
    ///
    /// The backend itself must reject a submission whose body exceeds
    /// `max_size` bytes or whose declared content type is not `content_type`.
    async fn presign_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
        max_size: u64,
    ) -> Result<PresignedPost, StorageError>;

    /// Issue a time-limited GET URL. Does not check that the object exists.
    async fn presign_download(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Remove an object. Removing a missing key is not an error.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError>;

    /// `Ok(false)` when the object is absent; any other failure is an error.
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;

    /// Create `bucket` unless it already exists.
    async fn create_bucket_if_absent(&self, bucket: &str) -> Result<(), StorageError>;

    /// Replace the bucket's access policy with `policy` (a JSON document).
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StorageError>;

    /// Short backend name for diagnostics.
    fn provider_name(&self) -> &'static str;
}
