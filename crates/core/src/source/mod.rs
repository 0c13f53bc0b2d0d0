//! Stream source abstraction and search fan-out.
//!
//! This module provides a `StreamSource` trait for querying heterogeneous
//! stream providers (addons, indexers) and a `SearchAggregator` that fans a
//! query out to all of them concurrently with per-source timeouts and
//! partial-failure merging.

mod addon;
mod aggregator;
mod indexer;
mod types;

pub use addon::AddonSource;
pub use aggregator::SearchAggregator;
pub use indexer::IndexerSource;
pub use types::*;
