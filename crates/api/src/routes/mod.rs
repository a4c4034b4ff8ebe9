//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod buckets;
pub mod health;
pub mod presign;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(buckets::routes())
        .merge(presign::routes())
}
