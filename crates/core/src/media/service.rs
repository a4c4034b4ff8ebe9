//! Media service implementation.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error};

use super::config::MediaConfig;
use super::error::MediaError;
use super::gate::{check_content_type, check_size};
use super::key::{check_key_components, derive_object_key};
use super::policy::BucketPolicy;
use super::types::{
    Bucket, BucketVisibility, DownloadRequest, DownloadResult, UploadPolicyRequest,
    UploadPolicyResult,
};
use crate::storage::{ObjectStorage, StorageError};

/// Validates requests and delegates signing and bucket work to the backend.
///
/// Stateless apart from the immutable configuration; cheap to share.
pub struct MediaService {
    storage: Arc<dyn ObjectStorage>,
    config: Arc<MediaConfig>,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, config: Arc<MediaConfig>) -> Self {
        Self { storage, config }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.storage.provider_name()
    }

    /// Issue an upload policy.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Content type is not allowed
    /// - Requested size exceeds the ceiling
    /// - Path or file name contains relative segments
    /// - Storage backend fails
    pub async fn presign_upload(
        &self,
        req: &UploadPolicyRequest,
    ) -> Result<UploadPolicyResult, MediaError> {
        debug!(
            bucket = %req.bucket,
            content_type = %req.content_type,
            max_file_size = req.max_file_size,
            "Presign upload requested"
        );

        check_content_type(&self.config, &req.content_type)?;
        check_size(&self.config, req.max_file_size)?;

        let path = req.path.as_deref().unwrap_or_default();
        let file_name = req.file_name.as_deref().unwrap_or_default();
        check_key_components(path, file_name)?;
        let object_key = derive_object_key(path, file_name, &req.content_type);

        // The requested size, not the ceiling, is what the backend enforces.
        let presigned = self
            .bounded(self.storage.presign_upload(
                &req.bucket,
                &object_key,
                &req.content_type,
                self.config.upload_ttl,
                req.max_file_size,
            ))
            .await
            .map_err(|e| backend_failure("presign_upload", &req.bucket, Some(&object_key), e))?;

        debug!(bucket = %req.bucket, key = %object_key, "Upload policy issued");

        Ok(UploadPolicyResult {
            url: presigned.url,
            object_key,
            expires_in: self.config.upload_ttl.as_secs(),
            form_data: presigned.form_data,
        })
    }

    /// Issue a download URL for an existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Object does not exist
    /// - Storage backend fails
    pub async fn presign_download(
        &self,
        req: &DownloadRequest,
    ) -> Result<DownloadResult, MediaError> {
        debug!(bucket = %req.bucket, key = %req.object_key, "Presign download requested");

        let exists = self
            .bounded(self.storage.object_exists(&req.bucket, &req.object_key))
            .await
            .map_err(|e| backend_failure("object_exists", &req.bucket, Some(&req.object_key), e))?;

        if !exists {
            return Err(MediaError::object_not_found(&req.bucket, &req.object_key));
        }

        let url = self
            .bounded(self.storage.presign_download(
                &req.bucket,
                &req.object_key,
                self.config.download_ttl,
            ))
            .await
            .map_err(|e| {
                backend_failure("presign_download", &req.bucket, Some(&req.object_key), e)
            })?;

        debug!(bucket = %req.bucket, key = %req.object_key, "Download URL issued");

        Ok(DownloadResult {
            url,
            expires_in: self.config.download_ttl.as_secs(),
        })
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), MediaError> {
        debug!(bucket = %bucket, key = %key, "Delete object requested");

        self.bounded(self.storage.delete_object(bucket, key))
            .await
            .map_err(|e| backend_failure("delete_object", bucket, Some(key), e))?;

        debug!(bucket = %bucket, key = %key, "Object deleted");
        Ok(())
    }

    /// Create a bucket if absent, then apply the public-read policy if asked.
    ///
    /// The two steps are not atomic: on `PolicyApplicationFailed` the bucket
    /// exists and only the policy step needs retrying.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Bucket creation fails
    /// - Policy application fails
    pub async fn create_bucket(
        &self,
        name: &str,
        visibility: BucketVisibility,
    ) -> Result<Bucket, MediaError> {
        debug!(bucket = %name, ?visibility, "Create bucket requested");

        self.bounded(self.storage.create_bucket_if_absent(name))
            .await
            .map_err(|e| backend_failure("create_bucket", name, None, e))?;

        if visibility.is_public() {
            let policy = BucketPolicy::public_read(name).to_json();
            self.bounded(self.storage.set_bucket_policy(name, &policy))
                .await
                .map_err(|source| {
                    error!(bucket = %name, error = %source, "Failed to set bucket policy");
                    MediaError::PolicyApplicationFailed {
                        bucket: name.to_string(),
                        source,
                    }
                })?;
            debug!(bucket = %name, "Bucket ready with public read policy");
        } else {
            debug!(bucket = %name, "Bucket ready with private policy");
        }

        Ok(Bucket {
            name: name.to_string(),
            visibility,
        })
    }

    /// Run a backend call under the configured timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        let limit = self.config.backend_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(StorageError::Timeout(limit)))
    }
}

fn backend_failure(
    operation: &'static str,
    bucket: &str,
    key: Option<&str>,
    source: StorageError,
) -> MediaError {
    error!(
        operation,
        bucket = %bucket,
        key = key.unwrap_or_default(),
        error = %source,
        "Storage backend call failed"
    );
    MediaError::backend(operation, bucket, key, source)
}
