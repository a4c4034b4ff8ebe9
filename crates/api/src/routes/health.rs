//! Health check and connectivity check endpoints.

use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppState, ApiError};

/// Fixed reply of the ping endpoint.
pub const PING_REPLY: &str = "Its fine here...!";

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Ping query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PingQuery {
    /// Free-form message, logged only.
    #[serde(default)]
    pub message: String,
}

/// Ping response.
#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// Fixed reply.
    pub message: &'static str,
}

/// Health check handler.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET `/ping`
async fn ping(
    query: Result<Query<PingQuery>, QueryRejection>,
) -> Result<Json<PingResponse>, ApiError> {
    let Query(query) = query?;
    debug!(message = %query.message, "Ping request received");
    Ok(Json(PingResponse {
        message: PING_REPLY,
    }))
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ping", get(ping))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{body_json, memory_state};

    fn app() -> Router {
        let (state, _) = memory_state();
        routes().with_state(state)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_ping_replies_regardless_of_message() {
        for uri in ["/ping", "/ping?message=hello"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_json(response).await;
            assert_eq!(body["message"], PING_REPLY);
        }
    }
}
