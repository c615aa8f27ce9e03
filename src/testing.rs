use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::catalog::CatalogCandidate;
use crate::client::{CoverImage, EmbedRequest, MetadataUpdate, TaggerBackend};
use crate::error::{Operation, Result, TaggerError};
use crate::library::AlbumGroup;

pub fn candidate(remote_id: i64, album: &str) -> CatalogCandidate {
    CatalogCandidate {
        remote_id,
        artist: "The Beatles".to_string(),
        album: album.to_string(),
        release_date: "1969-09-26T07:00:00Z".to_string(),
        preview_artwork_url: format!("https://img.example/{}/600x600bb.jpg", remote_id),
        high_res_artwork_url: format!("https://img.example/{}/10000x10000bb.jpg", remote_id),
    }
}

pub fn candidates(count: i64) -> Vec<CatalogCandidate> {
    (1..=count)
        .map(|id| candidate(id, &format!("Abbey Road ({})", id)))
        .collect()
}

fn failure(operation: Operation) -> TaggerError {
    TaggerError::Status {
        operation,
        status: StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// One scripted scan response: wait `delay`, then answer.
struct ScriptedScan {
    delay: Duration,
    albums: Option<Vec<AlbumGroup>>,
}

/// In-memory backend recording every call in order.
#[derive(Default)]
pub struct FakeBackend {
    albums: Mutex<Vec<AlbumGroup>>,
    scans: Mutex<VecDeque<ScriptedScan>>,
    candidates: Mutex<Vec<CatalogCandidate>>,
    search_delays: Mutex<VecDeque<Duration>>,
    embed_delays: Mutex<VecDeque<Duration>>,
    calls: Mutex<Vec<String>>,
    embeds: Mutex<Vec<EmbedRequest>>,
    updates: Mutex<Vec<MetadataUpdate>>,
    fail_scan: Mutex<bool>,
    fail_search: Mutex<bool>,
    fail_embed: Mutex<bool>,
    fail_update: Mutex<bool>,
}

impl FakeBackend {
    pub fn with_albums(albums: Vec<AlbumGroup>) -> Self {
        let backend = Self::default();
        *backend.albums.lock() = albums;
        backend
    }

    pub fn set_albums(&self, albums: Vec<AlbumGroup>) {
        *self.albums.lock() = albums;
    }

    pub fn set_candidates(&self, candidates: Vec<CatalogCandidate>) {
        *self.candidates.lock() = candidates;
    }

    /// Queues a scan answer; `None` answers with HTTP 500.
    pub fn script_scan(&self, delay: Duration, albums: Option<Vec<AlbumGroup>>) {
        self.scans.lock().push_back(ScriptedScan { delay, albums });
    }

    pub fn script_search_delay(&self, delay: Duration) {
        self.search_delays.lock().push_back(delay);
    }

    pub fn script_embed_delay(&self, delay: Duration) {
        self.embed_delays.lock().push_back(delay);
    }

    pub fn fail_scan(&self, fail: bool) {
        *self.fail_scan.lock() = fail;
    }

    pub fn fail_search(&self, fail: bool) {
        *self.fail_search.lock() = fail;
    }

    pub fn fail_embed(&self, fail: bool) {
        *self.fail_embed.lock() = fail;
    }

    pub fn fail_update(&self, fail: bool) {
        *self.fail_update.lock() = fail;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn embeds(&self) -> Vec<EmbedRequest> {
        self.embeds.lock().clone()
    }

    pub fn updates(&self) -> Vec<MetadataUpdate> {
        self.updates.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl TaggerBackend for FakeBackend {
    async fn scan(&self) -> Result<Vec<AlbumGroup>> {
        self.record("scan".to_string());
        let scripted = self.scans.lock().pop_front();
        match scripted {
            Some(scripted) => {
                tokio::time::sleep(scripted.delay).await;
                scripted.albums.ok_or_else(|| failure(Operation::Scan))
            }
            None => {
                tokio::task::yield_now().await;
                if *self.fail_scan.lock() {
                    return Err(failure(Operation::Scan));
                }
                Ok(self.albums.lock().clone())
            }
        }
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogCandidate>> {
        self.record(format!("search:{}:{}", query, limit));
        let delay = self.search_delays.lock().pop_front();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        if *self.fail_search.lock() {
            return Err(failure(Operation::Search));
        }
        let candidates = self.candidates.lock();
        Ok(candidates.iter().take(limit as usize).cloned().collect())
    }

    async fn embed_cover(&self, request: &EmbedRequest) -> Result<()> {
        self.record(format!("embed:{}", request.image_url));
        self.embeds.lock().push(request.clone());
        let delay = self.embed_delays.lock().pop_front();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        if *self.fail_embed.lock() {
            return Err(failure(Operation::Embed));
        }
        Ok(())
    }

    async fn update_metadata(&self, request: &MetadataUpdate) -> Result<()> {
        self.record(format!("update:{}", request.album));
        self.updates.lock().push(request.clone());
        tokio::task::yield_now().await;
        if *self.fail_update.lock() {
            return Err(failure(Operation::UpdateMetadata));
        }
        Ok(())
    }

    async fn fetch_cover(&self, path: &str) -> Result<CoverImage> {
        self.record(format!("cover:{}", path));
        Ok(CoverImage {
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
            content_type: Some("image/jpeg".to_string()),
        })
    }

    async fn download(&self, url: &str) -> Result<CoverImage> {
        self.record(format!("download:{}", url));
        Ok(CoverImage {
            bytes: Bytes::from_static(b"\x89PNG"),
            content_type: Some("image/png".to_string()),
        })
    }
}
