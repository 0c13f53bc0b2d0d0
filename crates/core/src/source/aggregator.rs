//! Concurrent search fan-out across configured sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{SearchQuery, SearchResultSet, SourceError, StreamSource};

/// A registered source with its configured defaults.
struct SourceHandle {
    source: Arc<dyn StreamSource>,
    enabled: bool,
    max_results: Option<u32>,
}

/// Fans a query out to all enabled sources concurrently and merges whatever
/// comes back, collecting successes and failures independently.
pub struct SearchAggregator {
    sources: Vec<SourceHandle>,
    source_timeout: Duration,
}

impl SearchAggregator {
    /// Create an aggregator with the given per-source timeout.
    pub fn new(source_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            source_timeout,
        }
    }

    /// Register a source with its configured defaults.
    pub fn register(
        mut self,
        source: Arc<dyn StreamSource>,
        enabled: bool,
        max_results: Option<u32>,
    ) -> Self {
        self.sources.push(SourceHandle {
            source,
            enabled,
            max_results,
        });
        self
    }

    /// Names of all registered sources.
    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|h| h.source.name().to_string())
            .collect()
    }

    /// Names of registered sources flagged as unlimited.
    pub fn unlimited_source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|h| h.source.unlimited())
            .map(|h| h.source.name().to_string())
            .collect()
    }

    /// Execute a search across all participating sources.
    ///
    /// A failing or timed-out source never aborts the others: its results are
    /// absent and its error is recorded in `source_errors`. Cached-only
    /// queries skip sources that cannot pre-filter, without counting them as
    /// failures. This call itself never fails.
    pub async fn search(&self, query: &SearchQuery) -> SearchResultSet {
        let start = Instant::now();

        // Resolve effective per-source settings (config defaults + query overrides)
        let participants: Vec<(&SourceHandle, Option<u32>)> = self
            .sources
            .iter()
            .filter_map(|handle| {
                let mut enabled = handle.enabled;
                let mut max_results = handle.max_results;
                if let Some(overrides) = &query.sources {
                    if let Some(sel) = overrides.iter().find(|s| s.name == handle.source.name()) {
                        enabled = sel.enabled;
                        max_results = sel.max_results.or(max_results);
                    }
                }
                if !enabled {
                    return None;
                }
                if query.cached_only && !handle.source.supports_cached_filter() {
                    debug!(
                        source = handle.source.name(),
                        "Skipping source for cached-only query"
                    );
                    return None;
                }
                Some((handle, max_results))
            })
            .collect();

        debug!(
            sources = participants.len(),
            query = %query.text,
            cached_only = query.cached_only,
            "Starting parallel search"
        );

        // Query all participating sources concurrently; each carries its own
        // deadline, and dropping the overall future cancels all of them.
        let search_futures: Vec<_> = participants
            .into_iter()
            .map(|(handle, max_results)| {
                let source = Arc::clone(&handle.source);
                let timeout = self.source_timeout;
                async move {
                    let name = source.name().to_string();
                    let result =
                        match tokio::time::timeout(timeout, source.search(query, max_results))
                            .await
                        {
                            Ok(result) => result,
                            Err(_) => Err(SourceError::Timeout),
                        };
                    (name, max_results, result)
                }
            })
            .collect();

        let outcomes = futures::future::join_all(search_futures).await;

        let mut results = Vec::new();
        let mut counts_by_source = HashMap::new();
        let mut source_errors = HashMap::new();

        for (name, max_results, outcome) in outcomes {
            match outcome {
                Ok(mut source_results) => {
                    if let Some(cap) = max_results {
                        source_results.truncate(cap as usize);
                    }
                    counts_by_source.insert(name, source_results.len());
                    results.append(&mut source_results);
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "Source search failed");
                    source_errors.insert(name, e.to_string());
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            results = results.len(),
            failed_sources = source_errors.len(),
            duration_ms = duration_ms,
            "Search complete"
        );

        SearchResultSet {
            query: query.clone(),
            total_count: results.len(),
            results,
            counts_by_source,
            source_errors,
            duration_ms,
        }
    }
}
