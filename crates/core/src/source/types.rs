//! Types for the stream source system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Query parameters for a stream search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search query.
    pub text: String,
    /// Only query sources that can pre-filter to debrid-cached content.
    #[serde(default)]
    pub cached_only: bool,
    /// Per-source overrides. Sources not listed keep their configured defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceSelection>>,
}

impl SearchQuery {
    /// Create a plain query with no overrides.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cached_only: false,
            sources: None,
        }
    }
}

/// Per-source override supplied with a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSelection {
    /// Source name as configured.
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cap on results taken from this source for this query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

fn default_enabled() -> bool {
    true
}

/// A raw stream candidate from a single source (before parsing/ranking).
///
/// Exactly one of `info_hash` and `url` is expected to be set: hash-backed
/// results go through the debrid lifecycle, direct-URL results bypass it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResult {
    /// Which source returned this result.
    pub source: String,
    /// Free-text release title.
    pub title: String,
    /// Free-text size hint (e.g., "1.5 GB"), when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Exact size in bytes, when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub seeders: u32,
    #[serde(default)]
    pub leechers: u32,
    /// When the release was published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    /// Info hash (lowercase hex) for torrent-backed results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Direct playable URL for non-torrent results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Index of the playable file inside a multi-file torrent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<u32>,
    /// Whether the source reports this result as already debrid-cached.
    #[serde(default)]
    pub cached: bool,
}

/// Aggregated search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// The query that was executed.
    pub query: SearchQuery,
    /// Concatenated results from all succeeding sources.
    pub results: Vec<RawResult>,
    pub total_count: usize,
    /// Result counts for sources that responded. Failed or skipped sources
    /// are absent rather than reported as zero.
    pub counts_by_source: HashMap<String, usize>,
    /// Any sources that failed (name -> error message).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_errors: HashMap<String, String>,
    /// How long the search took in milliseconds.
    pub duration_ms: u64,
}

/// Errors that can occur when querying a single source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Source API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for stream sources (addons, indexers).
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Source name for logging and per-source settings.
    fn name(&self) -> &str;

    /// Whether the source can pre-filter results to debrid-cached content.
    /// Sources that can't are skipped entirely for cached-only queries.
    fn supports_cached_filter(&self) -> bool {
        false
    }

    /// Whether the source returns unbounded result sets.
    fn unlimited(&self) -> bool {
        false
    }

    /// Execute a search. `limit` caps the number of results returned.
    async fn search(
        &self,
        query: &SearchQuery,
        limit: Option<u32>,
    ) -> Result<Vec<RawResult>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_serialization() {
        let query = SearchQuery {
            text: "test query".to_string(),
            cached_only: true,
            sources: Some(vec![SourceSelection {
                name: "torrentio".to_string(),
                enabled: true,
                max_results: Some(50),
            }]),
        };

        let json = serde_json::to_string(&query).unwrap();
        let parsed: SearchQuery = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.text, "test query");
        assert!(parsed.cached_only);
        let sources = parsed.sources.unwrap();
        assert_eq!(sources[0].name, "torrentio");
        assert_eq!(sources[0].max_results, Some(50));
    }

    #[test]
    fn test_search_query_minimal() {
        let json = r#"{"text": "minimal"}"#;
        let parsed: SearchQuery = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.text, "minimal");
        assert!(!parsed.cached_only);
        assert!(parsed.sources.is_none());
    }

    #[test]
    fn test_source_selection_enabled_by_default() {
        let json = r#"{"name": "jackett"}"#;
        let parsed: SourceSelection = serde_json::from_str(json).unwrap();
        assert!(parsed.enabled);
        assert!(parsed.max_results.is_none());
    }

    #[test]
    fn test_raw_result_serialization() {
        let result = RawResult {
            source: "torrentio".to_string(),
            title: "Show.Name.S01E05.1080p.WEB-DL".to_string(),
            size: Some("1.5 GB".to_string()),
            size_bytes: None,
            seeders: 42,
            leechers: 7,
            publish_date: None,
            info_hash: Some("abc123".to_string()),
            url: None,
            file_index: Some(0),
            cached: true,
        };

        let json = serde_json::to_string(&result).unwrap();
        let parsed: RawResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.source, "torrentio");
        assert_eq!(parsed.info_hash.as_deref(), Some("abc123"));
        assert_eq!(parsed.file_index, Some(0));
        assert!(parsed.cached);
        assert!(parsed.url.is_none());
    }

    #[test]
    fn test_search_result_set_skips_empty_errors() {
        let set = SearchResultSet {
            query: SearchQuery::new("test"),
            results: vec![],
            total_count: 0,
            counts_by_source: HashMap::new(),
            source_errors: HashMap::new(),
            duration_ms: 12,
        };

        let json = serde_json::to_string(&set).unwrap();
        assert!(!json.contains("source_errors"));
    }
}
