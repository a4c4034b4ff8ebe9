//! Upload and download policy configuration.

use std::collections::HashSet;
use std::time::Duration;

use mediabase_shared::MediaSettings;

/// Immutable policy configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Content types accepted for upload (exact match).
    pub allowed_content_types: HashSet<String>,
    /// Hard ceiling for a requested upload size, in bytes.
    pub max_file_size: u64,
    /// Lifetime of an upload policy.
    pub upload_ttl: Duration,
    /// Lifetime of a download URL.
    pub download_ttl: Duration,
    /// Upper bound for one storage backend call.
    pub backend_timeout: Duration,
}

impl MediaConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default upload TTL: 60 seconds.
    pub const DEFAULT_UPLOAD_TTL: Duration = Duration::from_secs(60);
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: Duration = Duration::from_secs(3600);
    /// Default backend call timeout: 30 seconds.
    pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_content_types: Self::default_content_types(),
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            upload_ttl: Self::DEFAULT_UPLOAD_TTL,
            download_ttl: Self::DEFAULT_DOWNLOAD_TTL,
            backend_timeout: Self::DEFAULT_BACKEND_TIMEOUT,
        }
    }

    /// Build from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &MediaSettings) -> Self {
        Self::new()
            .with_max_file_size(settings.max_file_size)
            .with_allowed_content_types(settings.allowed_content_types.iter().cloned())
            .with_upload_ttl(Duration::from_secs(settings.upload_ttl_secs))
            .with_download_ttl(Duration::from_secs(settings.download_ttl_secs))
            .with_backend_timeout(Duration::from_secs(settings.backend_timeout_secs))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Replace the allowed content types.
    #[must_use]
    pub fn with_allowed_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_content_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set upload policy TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, ttl: Duration) -> Self {
        self.upload_ttl = ttl;
        self
    }

    /// Set download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, ttl: Duration) -> Self {
        self.download_ttl = ttl;
        self
    }

    /// Set backend call timeout.
    #[must_use]
    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Default allowed content types.
    #[must_use]
    pub fn default_content_types() -> HashSet<String> {
        ["image/jpeg", "image/png", "image/webp"]
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_config_defaults() {
        let config = MediaConfig::new();
        assert_eq!(config.max_file_size, MediaConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.upload_ttl, Duration::from_secs(60));
        assert_eq!(config.download_ttl, Duration::from_secs(3600));
        assert!(config.allowed_content_types.contains("image/jpeg"));
    }

    #[test]
    fn test_from_settings() {
        let settings = MediaSettings {
            max_file_size: 2048,
            allowed_content_types: vec!["application/pdf".to_string()],
            upload_ttl_secs: 120,
            download_ttl_secs: 600,
            backend_timeout_secs: 5,
        };
        let config = MediaConfig::from_settings(&settings);

        assert_eq!(config.max_file_size, 2048);
        assert_eq!(config.allowed_content_types.len(), 1);
        assert!(config.allowed_content_types.contains("application/pdf"));
        assert!(!config.allowed_content_types.contains("image/jpeg"));
        assert_eq!(config.upload_ttl, Duration::from_secs(120));
        assert_eq!(config.download_ttl, Duration::from_secs(600));
        assert_eq!(config.backend_timeout, Duration::from_secs(5));
    }
}
