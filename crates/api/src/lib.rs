//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for bucket provisioning and presigned URL issuance
//! - Error-to-response mapping
//! - Tracing, CORS and request timeout middleware

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use mediabase_core::media::MediaService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Media service issuing policies and provisioning buckets.
    pub media: Arc<MediaService>,
}

impl AppState {
    /// Create state around a media service.
    #[must_use]
    pub fn new(media: MediaService) -> Self {
        Self {
            media: Arc::new(media),
        }
    }
}

/// Creates the main application router.
///
/// `request_timeout` bounds the whole request, backend calls included.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::memory_state;

    #[tokio::test]
    async fn test_router_nests_under_api_v1() {
        let (state, _) = memory_state();
        let app = create_router(state, Duration::from_secs(5));

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let (state, _) = memory_state();
        let app = create_router(state, Duration::from_secs(5));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/presign/upload")
                    .header(header::ORIGIN, "http://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&header::HeaderValue::from_static("*"))
        );
    }
}
