//! Prometheus metrics for observability.
//!
//! Counters for the engine's externally visible work: searches, per-source
//! failures, cache adds/resolves, and revalidation outcomes.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Searches executed.
pub static SEARCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("streamvault_searches_total", "Total searches executed").unwrap()
});

/// Per-source search failures.
pub static SOURCE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamvault_source_failures_total",
            "Search failures by source",
        ),
        &["source"],
    )
    .unwrap()
});

/// Cache add attempts by outcome.
pub static CACHE_ADDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("streamvault_cache_adds_total", "Cache adds by outcome"),
        &["outcome"],
    )
    .unwrap()
});

/// URL resolutions by outcome.
pub static RESOLVES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("streamvault_resolves_total", "URL resolutions by outcome"),
        &["outcome"],
    )
    .unwrap()
});

/// Revalidations by result.
pub static REVALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "streamvault_revalidations_total",
            "Stream revalidations by result",
        ),
        &["result"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(SEARCHES_TOTAL.clone()))
        .expect("Failed to register searches counter");
    registry
        .register(Box::new(SOURCE_FAILURES_TOTAL.clone()))
        .expect("Failed to register source failures counter");
    registry
        .register(Box::new(CACHE_ADDS_TOTAL.clone()))
        .expect("Failed to register cache adds counter");
    registry
        .register(Box::new(RESOLVES_TOTAL.clone()))
        .expect("Failed to register resolves counter");
    registry
        .register(Box::new(REVALIDATIONS_TOTAL.clone()))
        .expect("Failed to register revalidations counter");
}

/// Render the registry in Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
