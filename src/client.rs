use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::CatalogCandidate;
use crate::cover::CoverResolver;
use crate::error::{Operation, Result, TaggerError};
use crate::library::AlbumGroup;

const SCAN_ENDPOINT: &str = "/api/library/scan";
const SEARCH_ENDPOINT: &str = "/api/search/";
const EMBED_ENDPOINT: &str = "/api/library/embed";
const UPDATE_META_ENDPOINT: &str = "/api/library/update_meta";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub file_paths: Vec<String>,
    pub image_url: String,
}

/// Body of an update_meta call. `None` leaves the tag untouched; `Some("")`
/// clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub file_paths: Vec<String>,
    pub artist: String,
    pub album: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
}

/// Raw image bytes as served by the backend or the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl CoverImage {
    /// File extension matching the content type, `jpg` when unknown.
    pub fn extension(&self) -> &'static str {
        self.content_type
            .as_deref()
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.iter().find(|ext| **ext == "jpg").or(exts.first()))
            .copied()
            .unwrap_or("jpg")
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, &self.bytes).await?;
        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

/// The tagging backend as seen by the client. Every call is a suspension
/// point; success of the call is the whole completion signal.
#[async_trait]
pub trait TaggerBackend: Send + Sync {
    async fn scan(&self) -> Result<Vec<AlbumGroup>>;

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogCandidate>>;

    async fn embed_cover(&self, request: &EmbedRequest) -> Result<()>;

    async fn update_metadata(&self, request: &MetadataUpdate) -> Result<()>;

    /// Artwork of `path` at the bare (not cache-busted) cover address.
    async fn fetch_cover(&self, path: &str) -> Result<CoverImage>;

    /// Fetches an arbitrary image URL, e.g. catalog artwork.
    async fn download(&self, url: &str) -> Result<CoverImage>;
}

/// HTTP implementation of [`TaggerBackend`].
#[derive(Debug, Clone)]
pub struct TaggerClient {
    base_url: String,
    http: Client,
    covers: CoverResolver,
    music_path: Option<String>,
    country: Option<String>,
}

impl TaggerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)?;
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TaggerError::Client)?;

        Ok(Self {
            covers: CoverResolver::new(&base_url),
            base_url,
            http,
            music_path: None,
            country: None,
        })
    }

    /// Library directory sent with every scan; the backend default otherwise.
    pub fn with_music_path(mut self, music_path: Option<String>) -> Self {
        self.music_path = music_path;
        self
    }

    /// Catalog storefront country for searches.
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn covers(&self) -> &CoverResolver {
        &self.covers
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(operation: Operation, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            error!("Backend {} call failed with HTTP {}", operation, status);
            Err(TaggerError::Status { operation, status })
        }
    }

    async fn fetch_image(&self, operation: Operation, url: &str) -> Result<CoverImage> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TaggerError::http(operation, e))?;
        let response = Self::check(operation, response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TaggerError::http(operation, e))?;

        Ok(CoverImage { bytes, content_type })
    }

    async fn post_json<T: Serialize + ?Sized>(&self, operation: Operation, path: &str, body: &T) -> Result<Response> {
        let url = self.endpoint(path);
        debug!("POST {} ({})", url, operation);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TaggerError::http(operation, e))?;
        Self::check(operation, response)
    }
}

#[async_trait]
impl TaggerBackend for TaggerClient {
    async fn scan(&self) -> Result<Vec<AlbumGroup>> {
        let request = ScanRequest {
            path: self.music_path.clone(),
        };
        let response = self.post_json(Operation::Scan, SCAN_ENDPOINT, &request).await?;
        response
            .json()
            .await
            .map_err(|e| TaggerError::http(Operation::Scan, e))
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogCandidate>> {
        let limit = limit.to_string();
        let mut params = vec![("q", query), ("limit", limit.as_str())];
        if let Some(country) = &self.country {
            params.push(("country", country.as_str()));
        }

        let url = self.endpoint(SEARCH_ENDPOINT);
        debug!("GET {} q={:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| TaggerError::http(Operation::Search, e))?;
        Self::check(Operation::Search, response)?
            .json()
            .await
            .map_err(|e| TaggerError::http(Operation::Search, e))
    }

    async fn embed_cover(&self, request: &EmbedRequest) -> Result<()> {
        self.post_json(Operation::Embed, EMBED_ENDPOINT, request).await?;
        Ok(())
    }

    async fn update_metadata(&self, request: &MetadataUpdate) -> Result<()> {
        self.post_json(Operation::UpdateMetadata, UPDATE_META_ENDPOINT, request)
            .await?;
        Ok(())
    }

    async fn fetch_cover(&self, path: &str) -> Result<CoverImage> {
        let url = self.covers.resolve(path, None);
        self.fetch_image(Operation::Cover, &url).await
    }

    async fn download(&self, url: &str) -> Result<CoverImage> {
        self.fetch_image(Operation::Download, url).await
    }
}
