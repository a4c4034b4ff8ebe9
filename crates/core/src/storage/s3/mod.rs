//! S3-compatible backend and its SigV4 signing helpers.

mod backend;
mod post_policy;
mod signer;

pub use backend::S3Storage;
pub use post_policy::PostPolicy;
pub use signer::Signer;
