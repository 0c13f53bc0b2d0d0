//! Mock debrid client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{
    AddedTorrent, DebridClient, DebridError, DebridFile, DebridStatus, LibraryEntry,
    TorrentDetails,
};

/// Mock implementation of the `DebridClient` trait.
///
/// Keeps an in-memory library. `add_magnet` creates a downloaded,
/// immediately-resolvable entry by default; tests can override the status or
/// inject failures and delays to exercise the not-ready and single-flight
/// paths.
pub struct MockDebridClient {
    library: RwLock<Vec<LibraryEntry>>,
    details: RwLock<HashMap<String, TorrentDetails>>,
    add_delay: RwLock<Option<Duration>>,
    fail_next_add: RwLock<Option<DebridError>>,
    add_calls: AtomicUsize,
    unrestrict_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl Default for MockDebridClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDebridClient {
    /// Create a mock with an empty library.
    pub fn new() -> Self {
        Self {
            library: RwLock::new(Vec::new()),
            details: RwLock::new(HashMap::new()),
            add_delay: RwLock::new(None),
            fail_next_add: RwLock::new(None),
            add_calls: AtomicUsize::new(0),
            unrestrict_calls: AtomicUsize::new(0),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Put a downloaded single-file torrent into the library.
    pub async fn seed_library(&self, hash: &str, id: &str) {
        let hash = hash.to_lowercase();
        self.library.write().await.push(LibraryEntry {
            id: id.to_string(),
            hash: hash.clone(),
            filename: format!("{}.mkv", hash),
            size_bytes: 1_000_000,
            status: DebridStatus::Downloaded,
            added_at: None,
        });
        self.details
            .write()
            .await
            .insert(id.to_string(), downloaded_details(id, &hash));
    }

    /// Remove a library entry behind the resolver's back (simulates the user
    /// deleting it through another client).
    pub async fn evict(&self, id: &str) {
        self.library.write().await.retain(|e| e.id != id);
        self.details.write().await.remove(id);
    }

    /// Override the preparation status of a library torrent.
    pub async fn set_status(&self, id: &str, status: DebridStatus) {
        if let Some(entry) = self.library.write().await.iter_mut().find(|e| e.id == id) {
            entry.status = status;
        }
        if let Some(details) = self.details.write().await.get_mut(id) {
            details.status = status;
            if status == DebridStatus::Downloaded {
                if details.links.is_empty() {
                    details.links = vec![format!("https://debrid.mock/d/{}", id)];
                }
            } else {
                details.links.clear();
            }
        }
    }

    /// Replace the details of a library torrent (for multi-file tests).
    pub async fn set_details(&self, id: &str, details: TorrentDetails) {
        self.details.write().await.insert(id.to_string(), details);
    }

    /// Delay every `add_magnet` call (for single-flight tests).
    pub async fn set_add_delay(&self, delay: Duration) {
        *self.add_delay.write().await = Some(delay);
    }

    /// Fail the next `add_magnet` call with the given error.
    pub async fn fail_next_add(&self, error: DebridError) {
        *self.fail_next_add.write().await = Some(error);
    }

    /// How many times `add_magnet` was called.
    pub fn add_call_count(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// How many times `unrestrict_link` was called.
    pub fn unrestrict_call_count(&self) -> usize {
        self.unrestrict_calls.load(Ordering::SeqCst)
    }

    /// Number of entries currently in the mock library.
    pub async fn library_len(&self) -> usize {
        self.library.read().await.len()
    }
}

fn downloaded_details(id: &str, hash: &str) -> TorrentDetails {
    TorrentDetails {
        id: id.to_string(),
        hash: hash.to_string(),
        status: DebridStatus::Downloaded,
        progress: 100.0,
        files: vec![DebridFile {
            id: 1,
            path: format!("/{}.mkv", hash),
            size_bytes: 1_000_000,
            selected: true,
        }],
        links: vec![format!("https://debrid.mock/d/{}", id)],
    }
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock-debrid"
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddedTorrent, DebridError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.add_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.fail_next_add.write().await.take() {
            return Err(error);
        }

        let hash = magnet
            .split("btih:")
            .nth(1)
            .unwrap_or_default()
            .split('&')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        // Reuse the existing entry if the hash is already in the library
        if let Some(existing) = self.library.read().await.iter().find(|e| e.hash == hash) {
            return Ok(AddedTorrent {
                id: existing.id.clone(),
            });
        }

        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.seed_library(&hash, &id).await;
        Ok(AddedTorrent { id })
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, DebridError> {
        Ok(self.library.read().await.clone())
    }

    async fn torrent_info(&self, id: &str) -> Result<TorrentDetails, DebridError> {
        self.details
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DebridError::NotFound(id.to_string()))
    }

    async fn select_files(&self, id: &str, _file_ids: &[u32]) -> Result<(), DebridError> {
        if self.details.read().await.contains_key(id) {
            Ok(())
        } else {
            Err(DebridError::NotFound(id.to_string()))
        }
    }

    async fn unrestrict_link(&self, link: &str) -> Result<String, DebridError> {
        self.unrestrict_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.debrid.mock/{}?token=fresh", link))
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        let mut library = self.library.write().await;
        let before = library.len();
        library.retain(|e| e.id != id);
        if library.len() == before {
            return Err(DebridError::NotFound(id.to_string()));
        }
        self.details.write().await.remove(id);
        Ok(())
    }
}
