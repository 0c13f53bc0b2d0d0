//! Resume revalidation API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use streamvault_core::{Revalidation, ResolveError, WatchResumeProbe};

use crate::metrics;
use crate::state::AppState;

use super::ErrorResponse;

/// POST /api/v1/resume/revalidate
///
/// Decide whether a previously stored stream is still servable. Debrid URLs
/// are always re-resolved; direct URLs are probed with a 1-byte range
/// request. 409 means the backend is re-preparing the file; retry.
pub async fn revalidate(
    State(state): State<Arc<AppState>>,
    Json(probe): Json<WatchResumeProbe>,
) -> Result<Json<Revalidation>, impl IntoResponse> {
    match state.revalidator().revalidate(&probe).await {
        Ok(result) => {
            let label = match &result {
                Revalidation::Valid { .. } => "valid",
                Revalidation::Expired { .. } => "expired",
            };
            metrics::REVALIDATIONS_TOTAL.with_label_values(&[label]).inc();
            Ok(Json(result))
        }
        Err(e) => {
            metrics::REVALIDATIONS_TOTAL
                .with_label_values(&["error"])
                .inc();
            let status = match &e {
                ResolveError::NotReady => StatusCode::CONFLICT,
                ResolveError::UnknownHash(_) | ResolveError::UnknownFile(_) => {
                    StatusCode::NOT_FOUND
                }
                ResolveError::Backend(_) => StatusCode::BAD_GATEWAY,
            };
            Err((status, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}
