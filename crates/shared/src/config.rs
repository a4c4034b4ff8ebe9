//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage backend settings.
    pub storage: StorageSettings,
    /// Upload/download policy settings.
    #[serde(default)]
    pub media: MediaSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for a single HTTP request, backend calls included.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Object storage backend settings.
///
/// Only the fields relevant to the selected `provider` are read.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind: `s3` or `memory`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// S3 endpoint, either `host:port` or a full URL.
    #[serde(default)]
    pub endpoint: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_access_key: String,
    /// Region used for request signing.
    #[serde(default = "default_region")]
    pub region: String,
    /// Use HTTPS when `endpoint` carries no scheme.
    #[serde(default)]
    pub use_ssl: bool,
    /// Base URL reported by the in-memory backend.
    #[serde(default = "default_memory_base_url")]
    pub base_url: String,
}

fn default_provider() -> String {
    "s3".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_memory_base_url() -> String {
    "http://localhost:9000".to_string()
}

/// Upload and download policy settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Hard ceiling for a requested upload size, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Content types accepted for upload (exact match).
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    /// Upload policy lifetime in seconds.
    #[serde(default = "default_upload_ttl")]
    pub upload_ttl_secs: u64,
    /// Download URL lifetime in seconds.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_secs: u64,
    /// Upper bound for a single storage backend call, in seconds.
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_content_types: default_allowed_content_types(),
            upload_ttl_secs: default_upload_ttl(),
            download_ttl_secs: default_download_ttl(),
            backend_timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_content_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
    ]
}

fn default_upload_ttl() -> u64 {
    60
}

fn default_download_ttl() -> u64 {
    3600 // 1 hour
}

fn default_backend_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIABASE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("media.allowed_content_types")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
