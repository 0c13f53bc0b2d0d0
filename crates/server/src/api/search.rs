//! Search API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use streamvault_core::{
    descriptor, QualityBucket, RawResult, SearchQuery, SortOrder, StreamDescriptor,
};

use crate::metrics;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub query: SearchQuery,
    /// Restrict the ranked views to a single source.
    #[serde(default)]
    pub source_filter: Option<String>,
    /// Sort order within quality buckets.
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// A raw result paired with its parsed descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct StreamView {
    #[serde(flatten)]
    pub raw: RawResult,
    pub descriptor: StreamDescriptor,
}

#[derive(Debug, Serialize)]
pub struct BucketsView {
    pub four_k: Vec<StreamView>,
    pub full_hd: Vec<StreamView>,
    pub extra: Vec<StreamView>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total_count: usize,
    pub counts_by_source: HashMap<String, usize>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub source_errors: HashMap<String, String>,
    pub duration_ms: u64,
    /// All results in discovery order.
    pub streams: Vec<StreamView>,
    /// Ranked per-episode views, one per quality bucket.
    pub buckets: BucketsView,
    /// Season packs, always size-descending.
    pub season_packs: Vec<StreamView>,
}

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub unlimited: bool,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceInfo>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Fan the query out, parse every result, and return both the flat result
/// list and the ranked views.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    metrics::SEARCHES_TOTAL.inc();

    let set = state.aggregator().search(&request.query).await;
    for source in set.source_errors.keys() {
        metrics::SOURCE_FAILURES_TOTAL
            .with_label_values(&[source.as_str()])
            .inc();
    }

    let streams: Vec<StreamView> = set
        .results
        .iter()
        .map(|raw| StreamView {
            raw: raw.clone(),
            descriptor: descriptor::parse(raw),
        })
        .collect();

    let descriptors: Vec<StreamDescriptor> =
        streams.iter().map(|s| s.descriptor.clone()).collect();
    let ranker = state.ranker();
    let source_filter = request.source_filter.as_deref();

    let buckets = BucketsView {
        four_k: pair_ranked(
            ranker.bucket(
                &descriptors,
                QualityBucket::FourK,
                source_filter,
                request.sort_order,
                request.query.cached_only,
            ),
            &streams,
        ),
        full_hd: pair_ranked(
            ranker.bucket(
                &descriptors,
                QualityBucket::FullHd,
                source_filter,
                request.sort_order,
                request.query.cached_only,
            ),
            &streams,
        ),
        extra: pair_ranked(
            ranker.bucket(
                &descriptors,
                QualityBucket::Extra,
                source_filter,
                request.sort_order,
                request.query.cached_only,
            ),
            &streams,
        ),
    };
    let season_packs = pair_ranked(ranker.season_packs(&descriptors), &streams);

    Json(SearchResponse {
        total_count: set.total_count,
        counts_by_source: set.counts_by_source,
        source_errors: set.source_errors,
        duration_ms: set.duration_ms,
        streams,
        buckets,
        season_packs,
    })
}

/// GET /api/v1/sources
///
/// List configured sources.
pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
    let unlimited = state.aggregator().unlimited_source_names();
    let sources = state
        .aggregator()
        .source_names()
        .into_iter()
        .map(|name| SourceInfo {
            unlimited: unlimited.contains(&name),
            name,
        })
        .collect();

    Json(SourcesResponse { sources })
}

/// Pair ranked descriptors back with their raw results.
///
/// Each ranked descriptor consumes the first not-yet-used stream view whose
/// descriptor matches, so duplicates resolve in discovery order.
fn pair_ranked(ranked: Vec<StreamDescriptor>, pool: &[StreamView]) -> Vec<StreamView> {
    let mut used = vec![false; pool.len()];
    ranked
        .into_iter()
        .filter_map(|descriptor| {
            let position = pool
                .iter()
                .enumerate()
                .position(|(i, view)| !used[i] && view.descriptor == descriptor)?;
            used[position] = true;
            Some(pool[position].clone())
        })
        .collect()
}
