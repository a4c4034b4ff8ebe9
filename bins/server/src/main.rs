//! Mediabase API Server
//!
//! Main entry point for the Mediabase presigned-URL broker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediabase_api::{AppState, create_router};
use mediabase_core::media::{MediaConfig, MediaService};
use mediabase_core::storage::{self, StorageProvider};
use mediabase_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediabase=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Connect storage backend
    let provider = StorageProvider::from_settings(&config.storage)?;
    info!(?provider, "Storage backend configured");
    let backend = storage::connect(&provider)?;

    // Create media service
    let media = MediaService::new(backend, Arc::new(MediaConfig::from_settings(&config.media)));
    let media_config = media.config();
    info!(
        provider = media.provider_name(),
        max_file_size = media_config.max_file_size,
        allowed_content_types = ?media_config.allowed_content_types,
        upload_ttl_secs = media_config.upload_ttl.as_secs(),
        download_ttl_secs = media_config.download_ttl.as_secs(),
        "Media policy configured"
    );

    // Create router
    let app = create_router(
        AppState::new(media),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
