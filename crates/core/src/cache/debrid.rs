//! REST debrid backend implementation.
//!
//! Speaks the documented debrid HTTP contract: bearer-token auth,
//! `torrents/addMagnet`, `torrents` listing, `torrents/info/{id}`,
//! `torrents/selectFiles/{id}`, `unrestrict/link`, `torrents/delete/{id}`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::DebridConfig;

use super::types::{
    AddedTorrent, DebridClient, DebridError, DebridFile, DebridStatus, LibraryEntry,
    TorrentDetails,
};

/// REST debrid client implementation.
pub struct RestDebridClient {
    client: Client,
    config: DebridConfig,
}

impl RestDebridClient {
    /// Create a new debrid client.
    pub fn new(config: DebridConfig) -> Result<Self, DebridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| DebridError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn map_request_error(e: reqwest::Error) -> DebridError {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else {
            DebridError::ApiError(e.to_string())
        }
    }

    /// Map a non-success response into the error taxonomy.
    async fn map_status_error(response: Response) -> DebridError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let api_error: Option<ApiErrorBody> = serde_json::from_str(&body).ok();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DebridError::AuthenticationFailed(
                api_error
                    .map(|e| e.error)
                    .unwrap_or_else(|| "Invalid credentials".to_string()),
            ),
            StatusCode::NOT_FOUND => DebridError::NotFound(
                api_error
                    .map(|e| e.error)
                    .unwrap_or_else(|| "Resource not found".to_string()),
            ),
            StatusCode::TOO_MANY_REQUESTS => DebridError::RateLimited,
            _ => {
                // Active-download / traffic limits come back as service errors
                // with a dedicated error code
                if let Some(err) = api_error {
                    if matches!(err.error_code, Some(21 | 25 | 34)) {
                        return DebridError::QuotaExceeded(err.error);
                    }
                    return DebridError::ApiError(format!("HTTP {}: {}", status, err.error));
                }
                DebridError::ApiError(format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ))
            }
        }
    }

    /// Make an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<Response, DebridError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        Ok(response)
    }

    /// Make an authenticated POST request with form data.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Response, DebridError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .form(params)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl DebridClient for RestDebridClient {
    fn name(&self) -> &str {
        "debrid"
    }

    async fn add_magnet(&self, magnet: &str) -> Result<AddedTorrent, DebridError> {
        debug!("Adding magnet to debrid library");
        let response = self
            .post_form("/torrents/addMagnet", &[("magnet", magnet)])
            .await?;

        let added: AddMagnetResponse = response
            .json()
            .await
            .map_err(|e| DebridError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(AddedTorrent { id: added.id })
    }

    async fn list_library(&self) -> Result<Vec<LibraryEntry>, DebridError> {
        let response = self.get("/torrents").await?;
        let torrents: Vec<ApiTorrent> = response
            .json()
            .await
            .map_err(|e| DebridError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(torrents.into_iter().map(ApiTorrent::into_library_entry).collect())
    }

    async fn torrent_info(&self, id: &str) -> Result<TorrentDetails, DebridError> {
        let response = self.get(&format!("/torrents/info/{}", id)).await?;
        let info: ApiTorrentInfo = response
            .json()
            .await
            .map_err(|e| DebridError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(info.into_details())
    }

    async fn select_files(&self, id: &str, file_ids: &[u32]) -> Result<(), DebridError> {
        let files = if file_ids.is_empty() {
            "all".to_string()
        } else {
            file_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        self.post_form(
            &format!("/torrents/selectFiles/{}", id),
            &[("files", files.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn unrestrict_link(&self, link: &str) -> Result<String, DebridError> {
        let response = self
            .post_form("/unrestrict/link", &[("link", link)])
            .await?;

        let unrestricted: UnrestrictResponse = response
            .json()
            .await
            .map_err(|e| DebridError::ApiError(format!("Failed to parse response: {}", e)))?;

        Ok(unrestricted.download)
    }

    async fn delete_torrent(&self, id: &str) -> Result<(), DebridError> {
        let url = format!("{}/torrents/delete/{}", self.base_url(), id);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(Self::map_status_error(response).await);
        }
        Ok(())
    }
}

/// Parse the backend's RFC 3339 timestamps.
fn parse_api_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// Debrid API response types
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
    error_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct AddMagnetResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UnrestrictResponse {
    download: String,
}

#[derive(Debug, Deserialize)]
struct ApiTorrent {
    id: String,
    hash: String,
    filename: String,
    bytes: i64,
    status: String,
    added: Option<String>,
}

impl ApiTorrent {
    fn into_library_entry(self) -> LibraryEntry {
        LibraryEntry {
            id: self.id,
            hash: self.hash.to_lowercase(),
            filename: self.filename,
            size_bytes: self.bytes.max(0) as u64,
            status: DebridStatus::parse(&self.status),
            added_at: self.added.as_deref().and_then(parse_api_date),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiTorrentInfo {
    id: String,
    hash: String,
    status: String,
    progress: f64,
    #[serde(default)]
    files: Vec<ApiTorrentFile>,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTorrentFile {
    id: u32,
    path: String,
    bytes: i64,
    selected: i32,
}

impl ApiTorrentInfo {
    fn into_details(self) -> TorrentDetails {
        TorrentDetails {
            id: self.id,
            hash: self.hash.to_lowercase(),
            status: DebridStatus::parse(&self.status),
            progress: self.progress,
            files: self
                .files
                .into_iter()
                .map(|f| DebridFile {
                    id: f.id,
                    path: f.path,
                    size_bytes: f.bytes.max(0) as u64,
                    selected: f.selected != 0,
                })
                .collect(),
            links: self.links,
        }
    }
}
