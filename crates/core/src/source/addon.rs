//! Addon/stream-protocol source implementation.
//!
//! Addons answer a media query with a JSON list of stream candidates
//! (name, title, infoHash or direct url, size hints, cache flags).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::AddonConfig;

use super::{RawResult, SearchQuery, SourceError, StreamSource};

/// Matches the seeder hint embedded in addon titles, e.g. "👤 142" or "👤 1.2k".
static SEEDERS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"👤\s*([\d.]+)(k?)").unwrap());

/// Matches a free-text size hint anywhere in the title, e.g. "💾 1.5 GB".
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([\d.]+\s*(?:GB|GiB|MB|MiB|KB|KiB|TB|TiB))\b").unwrap());

/// Addon source implementation.
pub struct AddonSource {
    client: Client,
    config: AddonConfig,
}

impl AddonSource {
    /// Create a new addon source with the given configuration.
    pub fn new(config: AddonConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the addon stream URL for a query.
    fn build_search_url(&self, query: &SearchQuery) -> String {
        let mut url = format!(
            "{}/stream/search/{}.json",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(&query.text)
        );

        if query.cached_only && self.config.supports_cached_filter {
            url.push_str("?cached=true");
        }

        url
    }
}

#[async_trait]
impl StreamSource for AddonSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn supports_cached_filter(&self) -> bool {
        self.config.supports_cached_filter
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: Option<u32>,
    ) -> Result<Vec<RawResult>, SourceError> {
        let url = self.build_search_url(query);
        debug!(source = %self.config.name, "Querying addon");

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

        let addon_response: AddonResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ApiError(format!("Failed to parse response: {}", e)))?;

        let mut results: Vec<RawResult> = addon_response
            .streams
            .into_iter()
            .filter_map(|s| s.into_raw_result(&self.config.name))
            .collect();

        if let Some(limit) = limit {
            results.truncate(limit as usize);
        }

        debug!(
            source = %self.config.name,
            results = results.len(),
            "Addon search complete"
        );

        Ok(results)
    }
}

// Addon API response types (Stremio stream protocol)
#[derive(Debug, Deserialize)]
struct AddonResponse {
    streams: Vec<AddonStream>,
}

#[derive(Debug, Deserialize)]
struct AddonStream {
    /// Addon display name, e.g. "Torrentio\n1080p". Carries cache markers.
    name: Option<String>,
    /// Release title plus hint lines (seeders, size).
    title: Option<String>,
    #[serde(rename = "infoHash")]
    info_hash: Option<String>,
    #[serde(rename = "fileIdx")]
    file_idx: Option<u32>,
    /// Direct playable URL (mutually exclusive with infoHash in practice).
    url: Option<String>,
}

impl AddonStream {
    /// Convert an addon stream into a `RawResult`, dropping entries that
    /// carry neither an info hash nor a direct URL.
    fn into_raw_result(self, source: &str) -> Option<RawResult> {
        if self.info_hash.is_none() && self.url.is_none() {
            return None;
        }

        let title = self.title.unwrap_or_default();
        let cached = self.name.as_deref().is_some_and(has_cached_marker);

        Some(RawResult {
            source: source.to_string(),
            seeders: parse_seeders_hint(&title),
            leechers: 0,
            size: parse_size_hint(&title),
            size_bytes: None,
            publish_date: None,
            info_hash: self.info_hash.map(|h| h.to_lowercase()),
            url: self.url,
            file_index: self.file_idx,
            cached,
            title,
        })
    }
}

/// Detect debrid-cache markers addons put in the stream name ("RD+", "⚡").
fn has_cached_marker(name: &str) -> bool {
    name.contains("RD+") || name.contains('⚡')
}

/// Extract the seeder count hint from a title, e.g. "👤 142" or "👤 1.2k".
fn parse_seeders_hint(title: &str) -> u32 {
    let Some(caps) = SEEDERS_RE.captures(title) else {
        return 0;
    };
    let value: f64 = caps[1].parse().unwrap_or(0.0);
    let multiplier = if caps[2].is_empty() { 1.0 } else { 1000.0 };
    (value * multiplier) as u32
}

/// Extract the free-text size hint from a title, e.g. "1.5 GB".
fn parse_size_hint(title: &str) -> Option<String> {
    SIZE_RE.captures(title).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AddonConfig {
        AddonConfig {
            name: "torrentio".to_string(),
            url: "https://torrentio.strem.fun".to_string(),
            enabled: true,
            max_results: None,
            supports_cached_filter: true,
        }
    }

    #[test]
    fn test_build_search_url() {
        let source = AddonSource::new(test_config());
        let query = SearchQuery::new("breaking bad");
        let url = source.build_search_url(&query);
        assert_eq!(
            url,
            "https://torrentio.strem.fun/stream/search/breaking%20bad.json"
        );
    }

    #[test]
    fn test_build_search_url_cached_only() {
        let source = AddonSource::new(test_config());
        let mut query = SearchQuery::new("breaking bad");
        query.cached_only = true;
        let url = source.build_search_url(&query);
        assert!(url.ends_with("?cached=true"));
    }

    #[test]
    fn test_build_search_url_trailing_slash() {
        let mut config = test_config();
        config.url = "https://torrentio.strem.fun/".to_string();
        let source = AddonSource::new(config);
        let url = source.build_search_url(&SearchQuery::new("x"));
        assert!(!url.contains(".fun//"));
    }

    #[test]
    fn test_parse_seeders_hint() {
        assert_eq!(parse_seeders_hint("Title 👤 142 💾 1.5 GB"), 142);
        assert_eq!(parse_seeders_hint("Title 👤142"), 142);
        assert_eq!(parse_seeders_hint("Popular 👤 1.2k"), 1200);
        assert_eq!(parse_seeders_hint("No hints here"), 0);
    }

    #[test]
    fn test_parse_size_hint() {
        assert_eq!(
            parse_size_hint("Title 👤 142 💾 1.5 GB").as_deref(),
            Some("1.5 GB")
        );
        assert_eq!(parse_size_hint("Small.File.890 MB").as_deref(), Some("890 MB"));
        assert!(parse_size_hint("No size here").is_none());
    }

    #[test]
    fn test_cached_marker() {
        assert!(has_cached_marker("[RD+] Torrentio\n1080p"));
        assert!(has_cached_marker("⚡ instant"));
        assert!(!has_cached_marker("Torrentio\n1080p"));
    }

    #[test]
    fn test_stream_without_hash_or_url_dropped() {
        let stream = AddonStream {
            name: Some("Torrentio".to_string()),
            title: Some("Broken entry".to_string()),
            info_hash: None,
            file_idx: None,
            url: None,
        };
        assert!(stream.into_raw_result("torrentio").is_none());
    }

    #[test]
    fn test_stream_hash_lowercased() {
        let stream = AddonStream {
            name: Some("[RD+] Torrentio\n1080p".to_string()),
            title: Some("Show.S01E01.1080p 👤 10 💾 700 MB".to_string()),
            info_hash: Some("ABC123DEF".to_string()),
            file_idx: Some(1),
            url: None,
        };
        let raw = stream.into_raw_result("torrentio").unwrap();
        assert_eq!(raw.info_hash.as_deref(), Some("abc123def"));
        assert_eq!(raw.seeders, 10);
        assert_eq!(raw.size.as_deref(), Some("700 MB"));
        assert!(raw.cached);
    }
}
