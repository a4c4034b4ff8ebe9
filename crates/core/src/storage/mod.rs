//! Object storage abstraction and its backends.
//!
//! The rest of the system only sees [`ObjectStorage`]. Backends:
//! - S3-compatible: MinIO, AWS S3, Cloudflare R2 ([`S3Storage`])
//! - In-memory, for development and tests ([`MemoryStorage`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    dyn ObjectStorage                             │
//! ├──────────────────────────────┬──────────────────────────────────┤
//! │ presign_upload  (SigV4 POST) │ create_bucket_if_absent (HEAD/PUT)│
//! │ presign_download (OpenDAL)   │ set_bucket_policy  (PUT ?policy) │
//! │ object_exists   (OpenDAL)    │ delete_object      (OpenDAL)     │
//! └──────────────────────────────┴──────────────────────────────────┘
//! ```

mod capability;
mod config;
mod error;
mod form;
mod memory;
pub mod s3;

use std::sync::Arc;

use tracing::warn;

pub use capability::{ObjectStorage, PresignedPost};
#[cfg(test)]
pub use capability::MockObjectStorage;
pub use config::StorageProvider;
pub use error::StorageError;
pub use form::FormFields;
pub use memory::{MemoryObject, MemoryStorage};
pub use s3::S3Storage;

/// Build the backend selected by `provider`.
///
/// # Errors
///
/// Returns an error if the backend cannot be initialized.
pub fn connect(provider: &StorageProvider) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    let storage: Arc<dyn ObjectStorage> = match provider {
        StorageProvider::S3 { .. } => Arc::new(S3Storage::from_provider(provider)?),
        StorageProvider::Memory { base_url } => {
            warn!(
                base_url = %base_url,
                "Using in-memory storage; issued policies and URLs will not work against a real store"
            );
            Arc::new(MemoryStorage::new(base_url))
        }
    };
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_selects_backend() {
        let memory = connect(&StorageProvider::memory("http://localhost:9000")).expect("memory");
        assert_eq!(memory.provider_name(), "memory");

        let s3 = connect(&StorageProvider::s3(
            "localhost:9000",
            "minioadmin",
            "minioadmin",
            "us-east-1",
            false,
        ))
        .expect("s3");
        assert_eq!(s3.provider_name(), "s3");
    }
}
