//! Core logic for Mediabase.
//!
//! This crate holds request gating, key derivation, bucket policies and the
//! storage backends. It has no web framework dependencies.
//!
//! # Modules
//!
//! - `media` - Upload/download policy issuance and bucket provisioning
//! - `storage` - Object storage abstraction, S3 and in-memory backends

pub mod media;
pub mod storage;
