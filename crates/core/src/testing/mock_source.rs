//! Mock stream source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::source::{RawResult, SearchQuery, SourceError, StreamSource};

/// Mock implementation of the `StreamSource` trait.
///
/// Configured up front via builder methods, then shared behind an `Arc`:
/// - Return canned results (optionally after a delay)
/// - Fail every search with a fixed error
/// - Track how many times it was queried
pub struct MockSource {
    name: String,
    supports_cached_filter: bool,
    unlimited: bool,
    results: Vec<RawResult>,
    failure: Option<String>,
    delay: Option<Duration>,
    search_count: AtomicUsize,
}

impl MockSource {
    /// Create a mock source with no results.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supports_cached_filter: false,
            unlimited: false,
            results: Vec::new(),
            failure: None,
            delay: None,
            search_count: AtomicUsize::new(0),
        }
    }

    /// Return one hash-backed result per given info hash.
    pub fn with_hash_results(mut self, hashes: &[&str]) -> Self {
        self.results = hashes
            .iter()
            .map(|hash| RawResult {
                source: self.name.clone(),
                title: format!("Mock.Result.{}.1080p.WEB-DL", hash),
                size: Some("1.5 GB".to_string()),
                size_bytes: None,
                seeders: 10,
                leechers: 2,
                publish_date: None,
                info_hash: Some(hash.to_lowercase()),
                url: None,
                file_index: None,
                cached: false,
            })
            .collect();
        self
    }

    /// Return exactly these results.
    pub fn with_results(mut self, results: Vec<RawResult>) -> Self {
        self.results = results;
        self
    }

    /// Fail every search with the given message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Mark the source as able to pre-filter cached content.
    pub fn with_cached_filter(mut self) -> Self {
        self.supports_cached_filter = true;
        self
    }

    /// Mark the source as unlimited.
    pub fn with_unlimited(mut self) -> Self {
        self.unlimited = true;
        self
    }

    /// How many times `search` was called.
    pub fn search_count(&self) -> usize {
        self.search_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_cached_filter(&self) -> bool {
        self.supports_cached_filter
    }

    fn unlimited(&self) -> bool {
        self.unlimited
    }

    async fn search(
        &self,
        _query: &SearchQuery,
        limit: Option<u32>,
    ) -> Result<Vec<RawResult>, SourceError> {
        self.search_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(SourceError::ApiError(message.clone()));
        }

        let mut results = self.results.clone();
        if let Some(limit) = limit {
            results.truncate(limit as usize);
        }
        Ok(results)
    }
}
