use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Debrid URL and API key are present
/// - Source names are unique and source URLs are present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Debrid validation
    if config.debrid.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "debrid.url cannot be empty".to_string(),
        ));
    }
    if config.debrid.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "debrid.api_key cannot be empty".to_string(),
        ));
    }
    if config.debrid.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "debrid.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Source validation
    let mut names: HashSet<&str> = HashSet::new();
    for addon in &config.sources.addons {
        if addon.url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "sources.addons.{}: url cannot be empty",
                addon.name
            )));
        }
        if !names.insert(addon.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate source name: {}",
                addon.name
            )));
        }
    }
    if let Some(indexer) = &config.sources.indexer {
        if indexer.url.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "sources.indexer.{}: url cannot be empty",
                indexer.name
            )));
        }
        if !names.insert(indexer.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate source name: {}",
                indexer.name
            )));
        }
    }

    Ok(())
}
