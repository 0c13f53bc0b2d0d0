//! Stream URL revalidation for resume flows.
//!
//! Debrid URLs are short-lived by definition, so a stored URL is never
//! trusted on resume: the revalidator always re-resolves through the cache
//! registry. Direct URLs are probed with a 1-byte range request. The module
//! owns no storage; it returns a decision and leaves persistence to the
//! watch-history collaborator.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheResolver, DebridError, ResolveError};

/// Probe timeout for direct URLs. Kept short; a slow origin is as useless to
/// a resume flow as a dead one.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// What the resume flow knows about a previously played stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchResumeProbe {
    /// Debrid-backed stream: hash plus the file that was playing.
    Debrid {
        hash: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_index: Option<u32>,
    },
    /// Direct stream URL.
    Direct { url: String },
}

/// Revalidation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Revalidation {
    /// Freshly resolved (or probed) playable URL.
    Valid { url: String },
    Expired { reason: ExpiryReason },
}

/// Why a stream expired, so the caller can offer the right recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpiryReason {
    /// The library entry was deleted outside the app; "remove from history"
    /// and "get new source" are both sensible offers.
    RemovedFromLibrary,
    /// Direct URL probe failed; `status` is absent on network failure.
    ProbeFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
}

/// Revalidates previously issued stream URLs on resume.
pub struct StreamRevalidator {
    resolver: Arc<CacheResolver>,
    client: Client,
}

impl StreamRevalidator {
    /// Create a revalidator backed by the given cache resolver.
    pub fn new(resolver: Arc<CacheResolver>) -> Self {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { resolver, client }
    }

    /// Decide whether a previously stored stream is still servable.
    ///
    /// `Err(ResolveError::NotReady)` means the backend is re-preparing the
    /// file; callers poll rather than treating it as expired.
    pub async fn revalidate(
        &self,
        probe: &WatchResumeProbe,
    ) -> Result<Revalidation, ResolveError> {
        match probe {
            WatchResumeProbe::Debrid { hash, file_index } => {
                self.revalidate_debrid(hash, *file_index).await
            }
            WatchResumeProbe::Direct { url } => Ok(self.probe_direct(url).await),
        }
    }

    async fn revalidate_debrid(
        &self,
        hash: &str,
        file_index: Option<u32>,
    ) -> Result<Revalidation, ResolveError> {
        // Membership check first: a deleted library entry must surface as
        // "removed from library", not as a resolve failure
        match self.resolver.check_library(hash).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(hash = %hash, "Library entry gone, stream expired");
                return Ok(Revalidation::Expired {
                    reason: ExpiryReason::RemovedFromLibrary,
                });
            }
            Err(e) => return Err(ResolveError::Backend(e)),
        }

        // Always re-resolve; the stored URL is already assumed stale
        match self.resolver.resolve_url(hash, file_index).await {
            Ok(url) => Ok(Revalidation::Valid { url }),
            // Entry vanished between the membership check and resolution
            Err(ResolveError::Backend(DebridError::NotFound(_))) => Ok(Revalidation::Expired {
                reason: ExpiryReason::RemovedFromLibrary,
            }),
            Err(e) => Err(e),
        }
    }

    /// Probe a direct URL with a 1-byte range request.
    async fn probe_direct(&self, url: &str) -> Revalidation {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, "bytes=0-0")
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                Revalidation::Valid {
                    url: url.to_string(),
                }
            }
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "Direct URL probe rejected");
                Revalidation::Expired {
                    reason: ExpiryReason::ProbeFailed {
                        status: Some(response.status().as_u16()),
                    },
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Direct URL probe failed");
                Revalidation::Expired {
                    reason: ExpiryReason::ProbeFailed { status: None },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDebridClient;

    fn revalidator() -> StreamRevalidator {
        let debrid = Arc::new(MockDebridClient::new());
        StreamRevalidator::new(Arc::new(CacheResolver::new(debrid)))
    }

    #[tokio::test]
    async fn test_probe_direct_200_is_valid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream.mp4")
            .with_status(200)
            .create_async()
            .await;

        let url = format!("{}/stream.mp4", server.url());
        let result = revalidator()
            .revalidate(&WatchResumeProbe::Direct { url: url.clone() })
            .await
            .unwrap();

        assert!(matches!(result, Revalidation::Valid { url: u } if u == url));
    }

    #[tokio::test]
    async fn test_probe_direct_206_is_valid() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream.mp4")
            .match_header("range", "bytes=0-0")
            .with_status(206)
            .with_body("x")
            .create_async()
            .await;

        let url = format!("{}/stream.mp4", server.url());
        let result = revalidator()
            .revalidate(&WatchResumeProbe::Direct { url })
            .await
            .unwrap();

        assert!(matches!(result, Revalidation::Valid { .. }));
    }

    #[tokio::test]
    async fn test_probe_direct_410_is_expired() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream.mp4")
            .with_status(410)
            .create_async()
            .await;

        let url = format!("{}/stream.mp4", server.url());
        let result = revalidator()
            .revalidate(&WatchResumeProbe::Direct { url })
            .await
            .unwrap();

        assert!(matches!(
            result,
            Revalidation::Expired {
                reason: ExpiryReason::ProbeFailed { status: Some(410) }
            }
        ));
    }

    #[tokio::test]
    async fn test_probe_direct_404_is_expired() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/stream.mp4")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/stream.mp4", server.url());
        let result = revalidator()
            .revalidate(&WatchResumeProbe::Direct { url })
            .await
            .unwrap();

        assert!(matches!(
            result,
            Revalidation::Expired {
                reason: ExpiryReason::ProbeFailed { status: Some(404) }
            }
        ));
    }

    #[tokio::test]
    async fn test_probe_direct_network_failure_is_expired() {
        // Nothing listens on port 1
        let result = revalidator()
            .revalidate(&WatchResumeProbe::Direct {
                url: "http://127.0.0.1:1/stream.mp4".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            result,
            Revalidation::Expired {
                reason: ExpiryReason::ProbeFailed { status: None }
            }
        ));
    }

    #[test]
    fn test_probe_serialization() {
        let probe = WatchResumeProbe::Debrid {
            hash: "abc123".to_string(),
            file_index: Some(2),
        };
        let json = serde_json::to_string(&probe).unwrap();
        assert!(json.contains("\"type\":\"debrid\""));

        let direct: WatchResumeProbe =
            serde_json::from_str(r#"{"type": "direct", "url": "https://x/y.mp4"}"#).unwrap();
        assert!(matches!(direct, WatchResumeProbe::Direct { .. }));
    }

    #[test]
    fn test_revalidation_serialization() {
        let expired = Revalidation::Expired {
            reason: ExpiryReason::RemovedFromLibrary,
        };
        let json = serde_json::to_string(&expired).unwrap();
        assert!(json.contains("\"result\":\"expired\""));
        assert!(json.contains("removed_from_library"));
    }
}
