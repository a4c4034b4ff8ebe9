//! Upload and download policy issuance.
//!
//! Validates content type, size and key components before any storage call,
//! derives object keys, and turns bucket visibility into a policy document.

pub mod config;
pub mod error;
pub mod gate;
pub mod key;
pub mod policy;
pub mod service;
pub mod types;


pub use config::MediaConfig;
pub use error::MediaError;
pub use gate::{check_content_type, check_size, content_type_allowed, size_allowed};
pub use key::{check_key_components, derive_object_key, extension_for};
pub use policy::{BucketPolicy, PolicyStatement, Principal};
pub use service::MediaService;
pub use types::{
    Bucket, BucketVisibility, DownloadRequest, DownloadResult, UploadPolicyRequest,
    UploadPolicyResult,
};
