//! Storage configuration types.

use mediabase_shared::StorageSettings;
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: MinIO, Cloudflare R2, AWS S3, DigitalOcean Spaces
    S3 {
        /// Endpoint, either `host:port` or a full URL.
        endpoint: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Signing region.
        region: String,
        /// Use HTTPS when `endpoint` carries no scheme.
        use_ssl: bool,
    },
    /// In-process storage (development and tests only)
    Memory {
        /// Base URL used when issuing URLs.
        base_url: String,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider (MinIO, Cloudflare R2, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        use_ssl: bool,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            use_ssl,
        }
    }

    /// Create in-memory provider (development only).
    #[must_use]
    pub fn memory(base_url: impl Into<String>) -> Self {
        Self::Memory {
            base_url: base_url.into(),
        }
    }

    /// Build a provider from loaded settings.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown provider or missing S3 credentials.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        match settings.provider.as_str() {
            "s3" | "minio" => {
                if settings.endpoint.is_empty() {
                    return Err(StorageError::configuration("storage endpoint is required"));
                }
                if settings.access_key_id.is_empty() || settings.secret_access_key.is_empty() {
                    return Err(StorageError::configuration(
                        "storage credentials are required",
                    ));
                }
                Ok(Self::s3(
                    &settings.endpoint,
                    &settings.access_key_id,
                    &settings.secret_access_key,
                    &settings.region,
                    settings.use_ssl,
                ))
            }
            "memory" => Ok(Self::memory(&settings.base_url)),
            other => Err(StorageError::configuration(format!(
                "unknown storage provider '{other}'"
            ))),
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::Memory { .. } => "memory",
        }
    }

    /// Base URL of the backend, without a trailing slash.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        match self {
            Self::S3 {
                endpoint, use_ssl, ..
            } => {
                let endpoint = endpoint.trim_end_matches('/');
                if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.to_string()
                } else if *use_ssl {
                    format!("https://{endpoint}")
                } else {
                    format!("http://{endpoint}")
                }
            }
            Self::Memory { base_url } => base_url.trim_end_matches('/').to_string(),
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::S3 {
                endpoint,
                access_key_id,
                region,
                use_ssl,
                ..
            } => f
                .debug_struct("S3")
                .field("endpoint", endpoint)
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("region", region)
                .field("use_ssl", use_ssl)
                .finish(),
            Self::Memory { base_url } => f
                .debug_struct("Memory")
                .field("base_url", base_url)
                .finish(),
        }
    }
}
