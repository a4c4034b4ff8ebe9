//! Bucket provisioning and object deletion routes.

use axum::extract::rejection::JsonRejection;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use mediabase_core::media::BucketVisibility;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, ApiError};

/// Creates the bucket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/buckets", post(create_bucket))
        .route("/buckets/{bucket}/objects/{*key}", delete(delete_object))
}

/// Request body for creating a bucket.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    /// Bucket name.
    pub bucket_name: String,
    /// Grant anonymous read on every object.
    #[serde(default)]
    pub is_public: bool,
}

/// Response for operations that only report success.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always `true`; failures are reported as errors.
    pub success: bool,
}

/// POST `/buckets`
/// Create a bucket if absent and apply its visibility.
async fn create_bucket(
    State(state): State<AppState>,
    payload: Result<Json<CreateBucketRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.bucket_name.is_empty() {
        return Err(ApiError::validation("bucketName is required"));
    }

    let bucket = state
        .media
        .create_bucket(
            &payload.bucket_name,
            BucketVisibility::from_public(payload.is_public),
        )
        .await?;

    info!(bucket = %bucket.name, public = bucket.visibility.is_public(), "Bucket ready");
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE `/buckets/{bucket}/objects/{*key}`
/// Delete an object. Deleting a missing key succeeds.
async fn delete_object(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let key = key.trim_start_matches('/');
    if key.is_empty() {
        return Err(ApiError::validation("objectKey is required"));
    }

    state.media.delete_object(&bucket, key).await?;

    info!(bucket = %bucket, key = %key, "Object deleted");
    Ok(Json(SuccessResponse { success: true }))
}
