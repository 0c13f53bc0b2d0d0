//! Per-hash cache lifecycle driver.
//!
//! Owns the in-memory registry (hash → `CacheEntry`) and serializes add
//! operations per hash so concurrent callers collapse into one backend
//! request. State is rebuilt from the library listing on startup, so losing
//! the registry on restart is safe.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::types::{
    AddError, CacheEntry, CacheState, DebridClient, DebridError, DebridStatus, FileDescriptor,
    ResolveError, TorrentDetails,
};

/// Drives the not-added → adding → awaiting-url → playable lifecycle.
pub struct CacheResolver {
    debrid: Arc<dyn DebridClient>,
    /// Registry of every hash seen this session, keyed by lowercase hash.
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Per-hash add locks. Guarantees one in-flight add per hash.
    add_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheResolver {
    /// Create a resolver backed by the given debrid client.
    pub fn new(debrid: Arc<dyn DebridClient>) -> Self {
        Self {
            debrid,
            entries: RwLock::new(HashMap::new()),
            add_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuild the registry from the account's library listing.
    ///
    /// Called on startup; existing registry entries win over the listing so a
    /// resolved URL isn't forgotten mid-session. Returns how many entries the
    /// registry now tracks.
    pub async fn sync_library(&self) -> Result<usize, DebridError> {
        let library = self.debrid.list_library().await?;
        let mut entries = self.entries.write().await;

        for item in library {
            entries.entry(item.hash.clone()).or_insert(CacheEntry {
                hash: item.hash,
                torrent_id: Some(item.id),
                file_index: None,
                url: None,
                state: CacheState::AddedAwaitingUrl,
                added_at: item.added_at,
            });
        }

        info!(entries = entries.len(), "Cache registry synchronized");
        Ok(entries.len())
    }

    /// Look a hash up in the account library.
    ///
    /// A hit rehydrates the registry entry (skipping `Adding`); a miss for a
    /// hash the registry thought was in the library evicts the stale entry.
    pub async fn check_library(&self, hash: &str) -> Result<Option<CacheEntry>, DebridError> {
        let hash = hash.to_lowercase();
        let library = self.debrid.list_library().await?;

        match library.into_iter().find(|item| item.hash == hash) {
            Some(item) => {
                let mut entries = self.entries.write().await;
                let entry = entries
                    .entry(hash.clone())
                    .and_modify(|e| {
                        e.torrent_id = Some(item.id.clone());
                        if e.state == CacheState::NotAdded || e.state == CacheState::Failed {
                            e.state = CacheState::AddedAwaitingUrl;
                        }
                    })
                    .or_insert(CacheEntry {
                        hash: hash.clone(),
                        torrent_id: Some(item.id),
                        file_index: None,
                        url: None,
                        state: CacheState::AddedAwaitingUrl,
                        added_at: item.added_at,
                    });
                Ok(Some(entry.clone()))
            }
            None => {
                let mut entries = self.entries.write().await;
                if entries
                    .get(&hash)
                    .is_some_and(|e| e.torrent_id.is_some())
                {
                    debug!(hash = %hash, "Library entry gone, evicting stale registry entry");
                    entries.remove(&hash);
                }
                Ok(None)
            }
        }
    }

    /// Add a hash or magnet to the debrid cache.
    ///
    /// Concurrent calls for the same hash collapse into a single backend
    /// request: late arrivals wait on the per-hash lock and observe the
    /// leader's entry. A failed add marks the entry `Failed`; calling again
    /// re-enters `Adding`.
    pub async fn add_to_cache(&self, hash_or_magnet: &str) -> Result<CacheEntry, AddError> {
        let hash = normalize_hash_or_magnet(hash_or_magnet)?;

        let lock = self.add_lock_for(&hash).await;
        let _guard = lock.lock().await;

        // Another caller may have completed the add while we waited
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&hash) {
                if matches!(
                    entry.state,
                    CacheState::AddedAwaitingUrl | CacheState::Playable
                ) {
                    debug!(hash = %hash, "Add collapsed into existing entry");
                    return Ok(entry.clone());
                }
            }
        }

        self.set_state(&hash, CacheState::Adding).await;

        let result = self.perform_add(&hash).await;
        match result {
            Ok(entry) => Ok(entry),
            Err(e) => {
                warn!(hash = %hash, error = %e, "Add to cache failed");
                self.set_state(&hash, CacheState::Failed).await;
                Err(e)
            }
        }
    }

    async fn perform_add(&self, hash: &str) -> Result<CacheEntry, AddError> {
        let magnet = magnet_for_hash(hash);
        let added = self.debrid.add_magnet(&magnet).await?;
        // Select everything up front; the picker narrows down later
        self.debrid.select_files(&added.id, &[]).await?;

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(hash.to_string())
            .or_insert_with(|| CacheEntry::not_added(hash));
        entry.torrent_id = Some(added.id);
        entry.state = CacheState::AddedAwaitingUrl;
        entry.added_at = Some(Utc::now());

        info!(hash = %hash, torrent_id = ?entry.torrent_id, "Added to debrid cache");
        Ok(entry.clone())
    }

    /// Resolve a fresh time-limited stream URL for a cached entry.
    ///
    /// Fails with `ResolveError::NotReady` while the backend is still
    /// preparing the file; callers poll. A vanished library entry is evicted
    /// and surfaces as `Backend(NotFound)`.
    pub async fn resolve_url(
        &self,
        hash: &str,
        file_index: Option<u32>,
    ) -> Result<String, ResolveError> {
        let hash = hash.to_lowercase();
        let torrent_id = self.torrent_id_for(&hash).await?;

        let details = match self.debrid.torrent_info(&torrent_id).await {
            Ok(details) => details,
            Err(DebridError::NotFound(msg)) => {
                let mut entries = self.entries.write().await;
                entries.remove(&hash);
                return Err(ResolveError::Backend(DebridError::NotFound(msg)));
            }
            Err(e) => return Err(e.into()),
        };

        if details.status != DebridStatus::Downloaded || details.links.is_empty() {
            debug!(hash = %hash, status = ?details.status, "Stream not ready yet");
            return Err(ResolveError::NotReady);
        }

        let link = pick_link(&details, file_index)?;
        let url = self.debrid.unrestrict_link(&link).await?;

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&hash) {
            entry.url = Some(url.clone());
            entry.file_index = file_index.or(entry.file_index);
            entry.state = CacheState::Playable;
        }

        info!(hash = %hash, "Resolved stream URL");
        Ok(url)
    }

    /// Enumerate playable files of a cached multi-file torrent.
    pub async fn list_files(&self, hash: &str) -> Result<Vec<FileDescriptor>, ResolveError> {
        let hash = hash.to_lowercase();
        let torrent_id = self.torrent_id_for(&hash).await?;
        let details = self.debrid.torrent_info(&torrent_id).await?;

        Ok(details
            .files
            .into_iter()
            .map(|f| FileDescriptor {
                index: f.id,
                path: f.path,
                size_bytes: f.size_bytes,
            })
            .collect())
    }

    /// Delete an entry from both the backend library and the registry.
    pub async fn remove(&self, hash: &str) -> Result<(), DebridError> {
        let hash = hash.to_lowercase();
        let torrent_id = {
            let entries = self.entries.read().await;
            entries.get(&hash).and_then(|e| e.torrent_id.clone())
        };

        let Some(torrent_id) = torrent_id else {
            return Err(DebridError::NotFound(hash));
        };

        self.debrid.delete_torrent(&torrent_id).await?;
        let mut entries = self.entries.write().await;
        entries.remove(&hash);
        info!(hash = %hash, "Removed from debrid cache");
        Ok(())
    }

    /// Current registry entry for a hash (polling interface).
    pub async fn entry(&self, hash: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        entries.get(&hash.to_lowercase()).cloned()
    }

    /// All registry entries (polling interface).
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let entries = self.entries.read().await;
        entries.values().cloned().collect()
    }

    async fn add_lock_for(&self, hash: &str) -> Arc<Mutex<()>> {
        let mut locks = self.add_locks.lock().await;
        Arc::clone(locks.entry(hash.to_string()).or_default())
    }

    async fn set_state(&self, hash: &str, state: CacheState) {
        let mut entries = self.entries.write().await;
        entries
            .entry(hash.to_string())
            .or_insert_with(|| CacheEntry::not_added(hash))
            .state = state;
    }

    async fn torrent_id_for(&self, hash: &str) -> Result<String, ResolveError> {
        let entries = self.entries.read().await;
        entries
            .get(hash)
            .and_then(|e| e.torrent_id.clone())
            .ok_or_else(|| ResolveError::UnknownHash(hash.to_string()))
    }
}

/// Pick the restricted link matching the requested file index.
///
/// Links are ordered like the selected files; no index means the first file.
fn pick_link(details: &TorrentDetails, file_index: Option<u32>) -> Result<String, ResolveError> {
    let selected: Vec<_> = details.files.iter().filter(|f| f.selected).collect();

    let position = match file_index {
        None => 0,
        Some(index) => selected
            .iter()
            .position(|f| f.id == index)
            .ok_or(ResolveError::UnknownFile(index))?,
    };

    details
        .links
        .get(position)
        .cloned()
        .ok_or(ResolveError::NotReady)
}

/// Normalize user input (bare hash or magnet URI) to a lowercase info hash.
pub fn normalize_hash_or_magnet(input: &str) -> Result<String, AddError> {
    let trimmed = input.trim();
    if trimmed.starts_with("magnet:") {
        return extract_hash_from_magnet(trimmed)
            .ok_or_else(|| AddError::InvalidHash(trimmed.to_string()));
    }
    if is_info_hash(trimmed) {
        return Ok(trimmed.to_lowercase());
    }
    Err(AddError::InvalidHash(trimmed.to_string()))
}

/// Build a minimal magnet URI for a bare hash.
pub fn magnet_for_hash(hash: &str) -> String {
    format!("magnet:?xt=urn:btih:{}", hash)
}

/// Extract the info hash from a magnet URI.
fn extract_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, params) = magnet.split_once('?')?;
    for param in params.split('&') {
        if let Some(value) = param.strip_prefix("xt=urn:btih:") {
            if is_info_hash(value) {
                return Some(value.to_lowercase());
            }
            return None;
        }
    }
    None
}

/// Accept 40-char hex and 32-char base32 info hashes.
fn is_info_hash(s: &str) -> bool {
    match s.len() {
        40 => s.chars().all(|c| c.is_ascii_hexdigit()),
        32 => s
            .chars()
            .all(|c| c.is_ascii_alphabetic() || ('2'..='7').contains(&c)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_is_info_hash() {
        assert!(is_info_hash(HASH));
        assert!(is_info_hash(&HASH.to_uppercase()));
        assert!(is_info_hash("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567")); // base32
        assert!(!is_info_hash("abc123"));
        assert!(!is_info_hash("zz23456789abcdef0123456789abcdef01234567"));
    }

    #[test]
    fn test_normalize_bare_hash() {
        let upper = HASH.to_uppercase();
        assert_eq!(normalize_hash_or_magnet(&upper).unwrap(), HASH);
        assert_eq!(normalize_hash_or_magnet(HASH).unwrap(), HASH);
    }

    #[test]
    fn test_normalize_magnet() {
        let magnet = format!("magnet:?xt=urn:btih:{}&dn=Test", HASH.to_uppercase());
        assert_eq!(normalize_hash_or_magnet(&magnet).unwrap(), HASH);
    }

    #[test]
    fn test_normalize_invalid() {
        assert!(matches!(
            normalize_hash_or_magnet("not a hash"),
            Err(AddError::InvalidHash(_))
        ));
        assert!(matches!(
            normalize_hash_or_magnet("magnet:?dn=NoHash"),
            Err(AddError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_magnet_for_hash() {
        assert_eq!(
            magnet_for_hash(HASH),
            format!("magnet:?xt=urn:btih:{}", HASH)
        );
    }

    #[test]
    fn test_pick_link_skips_unselected_files() {
        use crate::cache::types::{DebridFile, DebridStatus};

        let details = TorrentDetails {
            id: "T1".to_string(),
            hash: HASH.to_string(),
            status: DebridStatus::Downloaded,
            progress: 100.0,
            files: vec![
                DebridFile {
                    id: 1,
                    path: "/a.mkv".to_string(),
                    size_bytes: 10,
                    selected: false,
                },
                DebridFile {
                    id: 2,
                    path: "/b.mkv".to_string(),
                    size_bytes: 20,
                    selected: true,
                },
                DebridFile {
                    id: 3,
                    path: "/c.mkv".to_string(),
                    size_bytes: 30,
                    selected: true,
                },
            ],
            links: vec!["link-b".to_string(), "link-c".to_string()],
        };

        // File id 3 is the second *selected* file, so it maps to links[1]
        assert_eq!(pick_link(&details, Some(3)).unwrap(), "link-c");
        assert_eq!(pick_link(&details, None).unwrap(), "link-b");
        assert!(matches!(
            pick_link(&details, Some(1)),
            Err(ResolveError::UnknownFile(1))
        ));
    }
}
