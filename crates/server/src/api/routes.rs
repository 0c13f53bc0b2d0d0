use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{cache, handlers, resume, search};
use crate::metrics;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Search
        .route("/search", post(search::search))
        .route("/sources", get(search::list_sources))
        // Cache lifecycle
        .route("/cache", post(cache::add_to_cache))
        .route("/cache", get(cache::list_entries))
        .route("/cache/{hash}", get(cache::get_entry))
        .route("/cache/{hash}", delete(cache::remove_entry))
        .route("/cache/{hash}/files", get(cache::list_files))
        .route("/cache/{hash}/resolve", post(cache::resolve_url))
        // Resume
        .route("/resume/revalidate", post(resume::revalidate))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(|| async { metrics::render() }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
