use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub debrid: DebridConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Debrid backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DebridConfig {
    /// Base URL of the debrid REST API (e.g., "https://api.real-debrid.com/rest/1.0")
    pub url: String,
    /// Bearer token for the debrid account
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Search behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Per-source request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub source_timeout_secs: u32,
    /// Maximum entries per quality bucket outside addon/cached-only mode (default: 10)
    #[serde(default = "default_bucket_cap")]
    pub bucket_cap: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source_timeout_secs: default_timeout(),
            bucket_cap: default_bucket_cap(),
        }
    }
}

fn default_bucket_cap() -> usize {
    10
}

/// Stream source configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Addon/stream-protocol sources
    #[serde(default)]
    pub addons: Vec<AddonConfig>,
    /// Optional indexer-style source (unbounded result sets)
    #[serde(default)]
    pub indexer: Option<IndexerConfig>,
}

/// A single addon source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    /// Source name, unique across all sources
    pub name: String,
    /// Addon base URL
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cap on results taken from this source per search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Whether the addon can pre-filter to debrid-cached content
    #[serde(default)]
    pub supports_cached_filter: bool,
}

/// Indexer source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Source name, unique across all sources
    pub name: String,
    /// Indexer API base URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Indexer API key
    pub api_key: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Unlimited sources are exempt from bucket caps and feed the Extra bucket
    #[serde(default = "default_true")]
    pub unlimited: bool,
}

fn default_true() -> bool {
    true
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub debrid: SanitizedDebridConfig,
    pub search: SearchConfig,
    pub sources: SanitizedSourcesConfig,
}

/// Sanitized debrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDebridConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSourcesConfig {
    pub addons: Vec<AddonConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer: Option<SanitizedIndexerConfig>,
}

/// Sanitized indexer config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedIndexerConfig {
    pub name: String,
    pub url: String,
    pub api_key_configured: bool,
    pub enabled: bool,
    pub unlimited: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            debrid: SanitizedDebridConfig {
                url: config.debrid.url.clone(),
                api_key_configured: !config.debrid.api_key.is_empty(),
                timeout_secs: config.debrid.timeout_secs,
            },
            search: config.search.clone(),
            sources: SanitizedSourcesConfig {
                addons: config.sources.addons.clone(),
                indexer: config.sources.indexer.as_ref().map(|i| SanitizedIndexerConfig {
                    name: i.name.clone(),
                    url: i.url.clone(),
                    api_key_configured: !i.api_key.is_empty(),
                    enabled: i.enabled,
                    unlimited: i.unlimited,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[debrid]
url = "https://api.real-debrid.com/rest/1.0"
api_key = "secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.debrid.timeout_secs, 30);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.search.bucket_cap, 10);
        assert!(config.sources.addons.is_empty());
        assert!(config.sources.indexer.is_none());
    }

    #[test]
    fn test_deserialize_missing_debrid_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_with_sources() {
        let toml = r#"
[debrid]
url = "https://api.real-debrid.com/rest/1.0"
api_key = "secret"

[[sources.addons]]
name = "torrentio"
url = "https://torrentio.strem.fun"
supports_cached_filter = true

[[sources.addons]]
name = "peerflix"
url = "https://peerflix.example"
enabled = false

[sources.indexer]
name = "jackett"
url = "http://localhost:9117"
api_key = "indexer-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sources.addons.len(), 2);
        assert!(config.sources.addons[0].enabled);
        assert!(config.sources.addons[0].supports_cached_filter);
        assert!(!config.sources.addons[1].enabled);

        let indexer = config.sources.indexer.as_ref().unwrap();
        assert_eq!(indexer.name, "jackett");
        assert!(indexer.enabled);
        assert!(indexer.unlimited);
    }

    #[test]
    fn test_sanitized_config_redacts_keys() {
        let toml = r#"
[debrid]
url = "https://api.real-debrid.com/rest/1.0"
api_key = "super-secret"

[sources.indexer]
name = "jackett"
url = "http://localhost:9117"
api_key = "indexer-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        assert!(sanitized.debrid.api_key_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!json.contains("indexer-key"));
    }

    #[test]
    fn test_sanitized_config_unconfigured_key() {
        let toml = r#"
[debrid]
url = "https://api.real-debrid.com/rest/1.0"
api_key = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.debrid.api_key_configured);
    }
}
