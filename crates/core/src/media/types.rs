//! Media request and result types.

use crate::storage::FormFields;

/// Request for an upload policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicyRequest {
    /// Target bucket.
    pub bucket: String,
    /// Declared content type of the upload.
    pub content_type: String,
    /// Largest body the client may send, in bytes.
    pub max_file_size: u64,
    /// Key prefix, joined with the file name.
    pub path: Option<String>,
    /// Explicit file name; a random one is generated when absent.
    pub file_name: Option<String>,
}

/// Issued upload policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicyResult {
    /// URL the multipart form is posted to.
    pub url: String,
    /// Derived object key.
    pub object_key: String,
    /// Seconds until the policy expires.
    pub expires_in: u64,
    /// Signed form fields, in submission order.
    pub form_data: FormFields,
}

/// Request for a download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Bucket name.
    pub bucket: String,
    /// Key of an existing object.
    pub object_key: String,
}

/// Issued download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Presigned GET URL.
    pub url: String,
    /// Seconds until the URL expires.
    pub expires_in: u64,
}

/// Access level of a bucket, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketVisibility {
    /// Backend default, no anonymous access.
    #[default]
    Private,
    /// Anonymous read of every object.
    PublicRead,
}

impl BucketVisibility {
    /// Map an `is_public` flag to a visibility.
    #[must_use]
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Self::PublicRead
        } else {
            Self::Private
        }
    }

    /// Whether anonymous reads are granted.
    #[must_use]
    pub fn is_public(self) -> bool {
        self == Self::PublicRead
    }
}

/// A bucket known to exist on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Visibility applied at creation.
    pub visibility: BucketVisibility,
}
