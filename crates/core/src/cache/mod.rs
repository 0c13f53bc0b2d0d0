//! Debrid cache operations and per-hash lifecycle state.
//!
//! `DebridClient` abstracts the REST backend; `CacheResolver` owns the
//! in-memory registry and drives the add → awaiting-url → playable state
//! machine with single-flight adds per hash.

mod debrid;
mod resolver;
mod types;

pub use debrid::RestDebridClient;
pub use resolver::{magnet_for_hash, normalize_hash_or_magnet, CacheResolver};
pub use types::*;
