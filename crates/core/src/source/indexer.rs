//! Indexer-style source implementation (Jackett aggregate endpoint).
//!
//! Unlike addons, the indexer returns unbounded result sets and knows
//! nothing about debrid caching, so it never serves cached-only queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::IndexerConfig;

use super::{RawResult, SearchQuery, SourceError, StreamSource};

/// Indexer source implementation.
pub struct IndexerSource {
    client: Client,
    config: IndexerConfig,
}

impl IndexerSource {
    /// Create a new indexer source with the given configuration.
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the indexer API URL for a search.
    fn build_search_url(&self, query: &SearchQuery) -> String {
        format!(
            "{}/api/v2.0/indexers/all/results?apikey={}&Query={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(&query.text)
        )
    }
}

#[async_trait]
impl StreamSource for IndexerSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn unlimited(&self) -> bool {
        self.config.unlimited
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: Option<u32>,
    ) -> Result<Vec<RawResult>, SourceError> {
        let url = self.build_search_url(query);
        debug!(source = %self.config.name, "Querying indexer");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else if e.is_connect() {
                SourceError::ConnectionFailed(e.to_string())
            } else {
                SourceError::ApiError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let indexer_response: IndexerResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse response: {}", e)))?;

        let mut results: Vec<RawResult> = indexer_response
            .Results
            .into_iter()
            .map(|r| r.into_raw_result(&self.config.name))
            .collect();

        if let Some(limit) = limit {
            results.truncate(limit as usize);
        }

        debug!(
            source = %self.config.name,
            results = results.len(),
            "Indexer search complete"
        );

        Ok(results)
    }
}

/// Parse the indexer's date format.
fn parse_indexer_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            // Some indexers omit the timezone
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Indexer API response types
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct IndexerResponse {
    Results: Vec<IndexerResult>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct IndexerResult {
    Title: String,
    InfoHash: Option<String>,
    Size: Option<i64>,
    Seeders: Option<i32>,
    Peers: Option<i32>,
    PublishDate: Option<String>,
}

impl IndexerResult {
    fn into_raw_result(self, source: &str) -> RawResult {
        let seeders = self.Seeders.unwrap_or(0).max(0) as u32;
        RawResult {
            source: source.to_string(),
            title: self.Title,
            size: None,
            size_bytes: self.Size.map(|s| s.max(0) as u64),
            seeders,
            leechers: self
                .Peers
                .unwrap_or(0)
                .saturating_sub(self.Seeders.unwrap_or(0))
                .max(0) as u32,
            publish_date: self.PublishDate.as_deref().and_then(parse_indexer_date),
            info_hash: self.InfoHash.map(|h| h.to_lowercase()),
            url: None,
            file_index: None,
            cached: false,
        }
    }
}
