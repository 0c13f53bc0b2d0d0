mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamvault_core::{
    load_config, validate_config, AddonSource, CacheResolver, DebridClient, IndexerSource, Ranker,
    RestDebridClient, SearchAggregator, StreamRevalidator, StreamSource,
};

use api::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("STREAMVAULT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");
    info!("Debrid backend: {}", config.debrid.url);

    // Create debrid client and cache resolver
    let debrid: Arc<dyn DebridClient> = Arc::new(
        RestDebridClient::new(config.debrid.clone())
            .context("Failed to create debrid client")?,
    );
    let resolver = Arc::new(CacheResolver::new(debrid));

    // Rehydrate the registry from the account library. The registry is
    // rebuilt from the backend by design, so a failure here only delays
    // rehydration until the next library call.
    match resolver.sync_library().await {
        Ok(count) => info!("Rehydrated {} cache entries from library", count),
        Err(e) => warn!("Library sync failed, starting with empty registry: {}", e),
    }

    // Register sources
    let mut aggregator = SearchAggregator::new(Duration::from_secs(
        config.search.source_timeout_secs as u64,
    ));
    for addon_config in &config.sources.addons {
        info!(source = %addon_config.name, url = %addon_config.url, "Registering addon source");
        let source: Arc<dyn StreamSource> = Arc::new(AddonSource::new(addon_config.clone()));
        aggregator = aggregator.register(source, addon_config.enabled, addon_config.max_results);
    }
    if let Some(indexer_config) = &config.sources.indexer {
        info!(source = %indexer_config.name, url = %indexer_config.url, "Registering indexer source");
        let source: Arc<dyn StreamSource> = Arc::new(IndexerSource::new(indexer_config.clone()));
        aggregator =
            aggregator.register(source, indexer_config.enabled, indexer_config.max_results);
    }

    let ranker = Ranker::new(config.search.bucket_cap)
        .with_unlimited_sources(aggregator.unlimited_source_names());
    let revalidator = StreamRevalidator::new(Arc::clone(&resolver));

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        aggregator,
        resolver,
        revalidator,
        ranker,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
