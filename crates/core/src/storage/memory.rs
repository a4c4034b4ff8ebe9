//! In-process storage backend (development and tests only).
//!
//! Keeps bucket and object bookkeeping in memory. Upload policies are signed
//! with a fixed local credential through the same POST-policy builder the S3
//! backend uses, so responses have the production shape.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::capability::{ObjectStorage, PresignedPost};
use super::error::StorageError;
use super::s3::{PostPolicy, Signer};

const LOCAL_ACCESS_KEY: &str = "mediabase-local";
const LOCAL_SECRET_KEY: &str = "mediabase-local-secret";

/// Metadata of an object held by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    /// Size in bytes.
    pub size: u64,
    /// Declared content type.
    pub content_type: String,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    policy: Option<String>,
    objects: HashMap<String, MemoryObject>,
}

/// In-memory storage backend.
pub struct MemoryStorage {
    base_url: String,
    signer: Signer,
    buckets: DashMap<String, MemoryBucket>,
}

impl MemoryStorage {
    /// Create an empty backend that reports URLs under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: Signer::new(LOCAL_ACCESS_KEY, LOCAL_SECRET_KEY, "us-east-1"),
            buckets: DashMap::new(),
        }
    }

    /// Record an object as if a client had uploaded it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the bucket does not exist.
    pub fn insert_object(
        &self,
        bucket: &str,
        key: &str,
        size: u64,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(format!("bucket {bucket}")))?;
        entry.objects.insert(
            key.to_string(),
            MemoryObject {
                size,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    /// Metadata of a stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<MemoryObject> {
        self.buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    /// Whether a bucket exists.
    #[must_use]
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// The policy document currently applied to a bucket.
    #[must_use]
    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.buckets.get(bucket).and_then(|b| b.policy.clone())
    }

    fn require_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        if self.buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(StorageError::rejected(
                404,
                "NoSuchBucket",
                format!("bucket {bucket} does not exist"),
            ))
        }
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn presign_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        ttl: Duration,
        max_size: u64,
    ) -> Result<PresignedPost, StorageError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| StorageError::operation("upload ttl out of range"))?;

        let form_data = PostPolicy {
            bucket,
            key,
            content_type,
            max_size,
            expires_at: now + ttl,
        }
        .sign(&self.signer, now);

        Ok(PresignedPost {
            url: format!("{}/{bucket}/", self.base_url),
            form_data,
        })
    }

    async fn presign_download(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "{}/{bucket}/{key}?X-Amz-Expires={}",
            self.base_url,
            ttl.as_secs()
        ))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.require_bucket(bucket)?;
        if let Some(mut entry) = self.buckets.get_mut(bucket) {
            entry.objects.remove(key);
        }
        Ok(())
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        // A missing bucket holds no objects, as a HEAD against S3 reports.
        Ok(self
            .buckets
            .get(bucket)
            .is_some_and(|b| b.objects.contains_key(key)))
    }

    async fn create_bucket_if_absent(&self, bucket: &str) -> Result<(), StorageError> {
        self.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), StorageError> {
        let mut entry = self.buckets.get_mut(bucket).ok_or_else(|| {
            StorageError::rejected(404, "NoSuchBucket", format!("bucket {bucket} does not exist"))
        })?;
        entry.policy = Some(policy.to_string());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
