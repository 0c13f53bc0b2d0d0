use std::sync::Arc;

use streamvault_core::{
    CacheResolver, Config, Ranker, SanitizedConfig, SearchAggregator, StreamRevalidator,
};

/// Shared application state
pub struct AppState {
    config: Config,
    aggregator: SearchAggregator,
    resolver: Arc<CacheResolver>,
    revalidator: StreamRevalidator,
    ranker: Ranker,
}

impl AppState {
    pub fn new(
        config: Config,
        aggregator: SearchAggregator,
        resolver: Arc<CacheResolver>,
        revalidator: StreamRevalidator,
        ranker: Ranker,
    ) -> Self {
        Self {
            config,
            aggregator,
            resolver,
            revalidator,
            ranker,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn aggregator(&self) -> &SearchAggregator {
        &self.aggregator
    }

    pub fn resolver(&self) -> &CacheResolver {
        &self.resolver
    }

    pub fn revalidator(&self) -> &StreamRevalidator {
        &self.revalidator
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }
}
