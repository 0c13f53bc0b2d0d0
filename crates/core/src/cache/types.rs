//! Types for debrid cache operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the debrid backend.
#[derive(Debug, Clone, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

/// Errors adding a result to the debrid cache.
#[derive(Debug, Clone, Error)]
pub enum AddError {
    #[error("Invalid info hash or magnet: {0}")]
    InvalidHash(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("Backend error: {0}")]
    Backend(DebridError),
}

impl From<DebridError> for AddError {
    fn from(e: DebridError) -> Self {
        match e {
            DebridError::AuthenticationFailed(msg) => AddError::Auth(msg),
            DebridError::QuotaExceeded(msg) => AddError::QuotaExhausted(msg),
            other => AddError::Backend(other),
        }
    }
}

/// Errors resolving a playable URL for a cached entry.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The backend hasn't finished preparing the file; retry, don't fail.
    #[error("File not ready yet")]
    NotReady,

    #[error("Hash not tracked: {0}")]
    UnknownHash(String),

    #[error("File index {0} not found in torrent")]
    UnknownFile(u32),

    #[error("Backend error: {0}")]
    Backend(DebridError),
}

impl From<DebridError> for ResolveError {
    fn from(e: DebridError) -> Self {
        ResolveError::Backend(e)
    }
}

/// Lifecycle state of a cache entry.
///
/// Transitions only move forward; a failure resets the entry so a retry
/// re-enters `Adding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    NotAdded,
    Adding,
    AddedAwaitingUrl,
    Playable,
    Failed,
}

impl CacheState {
    /// Returns the string representation for API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheState::NotAdded => "not_added",
            CacheState::Adding => "adding",
            CacheState::AddedAwaitingUrl => "added_awaiting_url",
            CacheState::Playable => "playable",
            CacheState::Failed => "failed",
        }
    }
}

/// Per-hash cache entry. The hash (lowercase hex) is the canonical key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Info hash, lowercase hex.
    pub hash: String,
    /// Backend torrent id, once the entry exists in the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent_id: Option<String>,
    /// Selected file index inside a multi-file torrent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<u32>,
    /// Last resolved stream URL. Time-limited; never trusted on resume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub state: CacheState,
    /// When the entry was added to the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// A fresh untracked entry for the given (already lowercased) hash.
    pub fn not_added(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            torrent_id: None,
            file_index: None,
            url: None,
            state: CacheState::NotAdded,
            added_at: None,
        }
    }
}

/// A playable file inside a library torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Backend file index (stable across calls).
    pub index: u32,
    /// Path within the torrent.
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Preparation status of a library torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebridStatus {
    WaitingFilesSelection,
    Queued,
    Downloading,
    Downloaded,
    Error,
    Dead,
    Unknown,
}

impl DebridStatus {
    /// Parse the backend's status string.
    pub fn parse(status: &str) -> Self {
        match status {
            "waiting_files_selection" => DebridStatus::WaitingFilesSelection,
            "magnet_conversion" | "queued" => DebridStatus::Queued,
            "downloading" | "compressing" | "uploading" => DebridStatus::Downloading,
            "downloaded" => DebridStatus::Downloaded,
            "magnet_error" | "error" | "virus" => DebridStatus::Error,
            "dead" => DebridStatus::Dead,
            _ => DebridStatus::Unknown,
        }
    }
}

/// Result of adding a magnet to the debrid backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedTorrent {
    /// Backend torrent id.
    pub id: String,
}

/// A torrent in the debrid account's library listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: String,
    /// Info hash, lowercase hex.
    pub hash: String,
    pub filename: String,
    pub size_bytes: u64,
    pub status: DebridStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// Full details of a library torrent (files + restricted links).
#[derive(Debug, Clone)]
pub struct TorrentDetails {
    pub id: String,
    pub hash: String,
    pub status: DebridStatus,
    pub progress: f64,
    pub files: Vec<DebridFile>,
    /// Restricted links, one per selected file, in file order.
    pub links: Vec<String>,
}

/// A file entry in a library torrent.
#[derive(Debug, Clone)]
pub struct DebridFile {
    pub id: u32,
    pub path: String,
    pub size_bytes: u64,
    pub selected: bool,
}

/// Trait for debrid backends.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Add a magnet to the account library.
    async fn add_magnet(&self, magnet: &str) -> Result<AddedTorrent, DebridError>;

    /// List all torrents in the account library.
    async fn list_library(&self) -> Result<Vec<LibraryEntry>, DebridError>;

    /// Get details (files, links) for a library torrent.
    async fn torrent_info(&self, id: &str) -> Result<TorrentDetails, DebridError>;

    /// Select which files of a torrent to prepare. Empty slice selects all.
    async fn select_files(&self, id: &str, file_ids: &[u32]) -> Result<(), DebridError>;

    /// Turn a restricted library link into a time-limited streamable URL.
    async fn unrestrict_link(&self, link: &str) -> Result<String, DebridError>;

    /// Delete a library torrent by id.
    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError>;
}
