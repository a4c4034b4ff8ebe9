//! Presigned upload and download routes.

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, extract::State, routing::post};
use mediabase_core::media::{DownloadRequest, UploadPolicyRequest};
use mediabase_core::storage::FormFields;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, ApiError};

/// Creates the presign routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/presign/upload", post(presign_upload))
        .route("/presign/download", post(presign_download))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for an upload policy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    /// Target bucket.
    pub bucket_name: String,
    /// Declared content type.
    pub content_type: String,
    /// Largest body the client will send, in bytes.
    pub max_file_size: u64,
    /// Key prefix.
    #[serde(default)]
    pub path: Option<String>,
    /// Explicit file name.
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Response carrying a signed POST policy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    /// URL the multipart form is posted to.
    pub presigned_url: String,
    /// Key the object will be stored under.
    pub object_key: String,
    /// Seconds until the policy expires.
    pub expires_in: u64,
    /// Form fields to submit before the file part, in order.
    pub form_data: FormFields,
}

/// Request body for a download URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignDownloadRequest {
    /// Bucket name.
    pub bucket_name: String,
    /// Key of an existing object.
    pub object_key: String,
}

/// Response carrying a presigned GET URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignDownloadResponse {
    /// Presigned URL.
    pub presigned_url: String,
    /// Seconds until the URL expires.
    pub expires_in: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/presign/upload`
async fn presign_upload(
    State(state): State<AppState>,
    payload: Result<Json<PresignUploadRequest>, JsonRejection>,
) -> Result<Json<PresignUploadResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.bucket_name.is_empty() {
        return Err(ApiError::validation("bucketName is required"));
    }

    let request = UploadPolicyRequest {
        bucket: payload.bucket_name,
        content_type: payload.content_type,
        max_file_size: payload.max_file_size,
        path: payload.path,
        file_name: payload.file_name,
    };
    let result = state.media.presign_upload(&request).await?;

    info!(bucket = %request.bucket, key = %result.object_key, "Upload policy issued");
    Ok(Json(PresignUploadResponse {
        presigned_url: result.url,
        object_key: result.object_key,
        expires_in: result.expires_in,
        form_data: result.form_data,
    }))
}

/// POST `/presign/download`
async fn presign_download(
    State(state): State<AppState>,
    payload: Result<Json<PresignDownloadRequest>, JsonRejection>,
) -> Result<Json<PresignDownloadResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.bucket_name.is_empty() {
        return Err(ApiError::validation("bucketName is required"));
    }
    if payload.object_key.is_empty() {
        return Err(ApiError::validation("objectKey is required"));
    }

    let request = DownloadRequest {
        bucket: payload.bucket_name,
        object_key: payload.object_key,
    };
    let result = state.media.presign_download(&request).await?;

    info!(bucket = %request.bucket, key = %request.object_key, "Download URL issued");
    Ok(Json(PresignDownloadResponse {
        presigned_url: result.url,
        expires_in: result.expires_in,
    }))
}
