//! Streamvault core: multi-source stream resolution and debrid caching.
//!
//! The engine pipeline: a query fans out through [`source::SearchAggregator`],
//! raw results are parsed into descriptors by [`descriptor::parse`], ranked by
//! [`ranking::Ranker`], and a selected result is driven through the debrid
//! lifecycle by [`cache::CacheResolver`], with [`lifecycle::StreamRevalidator`]
//! re-checking previously issued URLs on resume.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod lifecycle;
pub mod ranking;
pub mod source;
pub mod testing;

pub use cache::{
    AddError, CacheEntry, CacheResolver, CacheState, DebridClient, DebridError, FileDescriptor,
    ResolveError, RestDebridClient,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use descriptor::{parse, HdrKind, Quality, StreamDescriptor};
pub use lifecycle::{ExpiryReason, Revalidation, StreamRevalidator, WatchResumeProbe};
pub use ranking::{QualityBucket, Ranker, SortOrder};
pub use source::{
    AddonSource, IndexerSource, RawResult, SearchAggregator, SearchQuery, SearchResultSet,
    SourceError, SourceSelection, StreamSource,
};
