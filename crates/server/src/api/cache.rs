//! Cache operation API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use streamvault_core::{AddError, CacheEntry, DebridError, FileDescriptor, ResolveError};

use crate::metrics;
use crate::state::AppState;

use super::{ErrorResponse, SuccessResponse};

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddCacheRequest {
    /// Bare info hash or magnet URI.
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub file_index: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CacheListResponse {
    pub entries: Vec<CacheEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileDescriptor>,
    pub count: usize,
}

fn add_error_response(e: AddError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        AddError::InvalidHash(_) => StatusCode::BAD_REQUEST,
        AddError::Auth(_) => StatusCode::BAD_GATEWAY,
        AddError::QuotaExhausted(_) => StatusCode::CONFLICT,
        AddError::Backend(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

fn resolve_error_response(e: ResolveError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        // Retryable: the backend is still preparing the file
        ResolveError::NotReady => StatusCode::CONFLICT,
        ResolveError::UnknownHash(_) | ResolveError::UnknownFile(_) => StatusCode::NOT_FOUND,
        ResolveError::Backend(DebridError::NotFound(_)) => StatusCode::NOT_FOUND,
        ResolveError::Backend(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ErrorResponse::new(e.to_string())))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/cache
///
/// Add a hash or magnet to the debrid cache.
pub async fn add_to_cache(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddCacheRequest>,
) -> Result<Json<CacheEntry>, impl IntoResponse> {
    match state.resolver().add_to_cache(&request.hash).await {
        Ok(entry) => {
            metrics::CACHE_ADDS_TOTAL.with_label_values(&["ok"]).inc();
            Ok(Json(entry))
        }
        Err(e) => {
            let outcome = match &e {
                AddError::InvalidHash(_) => "invalid_hash",
                AddError::Auth(_) => "auth",
                AddError::QuotaExhausted(_) => "quota",
                AddError::Backend(_) => "backend",
            };
            metrics::CACHE_ADDS_TOTAL.with_label_values(&[outcome]).inc();
            Err(add_error_response(e))
        }
    }
}

/// GET /api/v1/cache
///
/// All registry entries.
pub async fn list_entries(State(state): State<Arc<AppState>>) -> Json<CacheListResponse> {
    let entries = state.resolver().entries().await;
    let count = entries.len();
    Json(CacheListResponse { entries, count })
}

/// GET /api/v1/cache/{hash}
///
/// Registry entry for a hash; checks the account library on a registry miss.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<CacheEntry>, impl IntoResponse> {
    if let Some(entry) = state.resolver().entry(&hash).await {
        return Ok(Json(entry));
    }

    match state.resolver().check_library(&hash).await {
        Ok(Some(entry)) => Ok(Json(entry)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Hash not cached: {}", hash))),
        )),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// DELETE /api/v1/cache/{hash}
///
/// Remove an entry from the backend library and the registry.
pub async fn remove_entry(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<SuccessResponse>, impl IntoResponse> {
    match state.resolver().remove(&hash).await {
        Ok(()) => Ok(Json(SuccessResponse {
            message: format!("Removed {}", hash),
        })),
        Err(DebridError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Hash not cached: {}", hash))),
        )),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// GET /api/v1/cache/{hash}/files
///
/// Playable files of a cached multi-file torrent.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<FileListResponse>, impl IntoResponse> {
    match state.resolver().list_files(&hash).await {
        Ok(files) => {
            let count = files.len();
            Ok(Json(FileListResponse { files, count }))
        }
        Err(e) => Err(resolve_error_response(e)),
    }
}

/// POST /api/v1/cache/{hash}/resolve
///
/// Resolve a fresh time-limited stream URL. 409 means not ready yet; retry.
pub async fn resolve_url(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, impl IntoResponse> {
    match state
        .resolver()
        .resolve_url(&hash, request.file_index)
        .await
    {
        Ok(url) => {
            metrics::RESOLVES_TOTAL.with_label_values(&["ok"]).inc();
            Ok(Json(ResolveResponse { url }))
        }
        Err(e) => {
            let outcome = match &e {
                ResolveError::NotReady => "not_ready",
                ResolveError::UnknownHash(_) | ResolveError::UnknownFile(_) => "unknown",
                ResolveError::Backend(_) => "backend",
            };
            metrics::RESOLVES_TOTAL.with_label_values(&[outcome]).inc();
            Err(resolve_error_response(e))
        }
    }
}
