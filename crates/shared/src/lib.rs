//! Shared errors and configuration for Mediabase.
//!
//! This crate provides the pieces every other crate needs:
//! - Application-wide error type with HTTP-facing status and code
//! - Configuration management

pub mod config;
pub mod error;


pub use config::{AppConfig, MediaSettings, ServerConfig, StorageSettings};
pub use error::AppError;
