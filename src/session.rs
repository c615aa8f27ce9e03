use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::client::TaggerBackend;
use crate::cover::{CacheEpoch, CoverResolver};
use crate::detail::AlbumDetail;
use crate::error::Result;
use crate::library::AlbumGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { albums: usize },
    /// A newer scan was issued (or the session torn down) while this one
    /// was in flight; its response was dropped.
    Stale,
}

/// One grid entry of the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumTile {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub year: String,
    /// `None` means draw the placeholder; no image is fetched.
    pub cover_url: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    albums: Arc<Vec<AlbumGroup>>,
    selected: Option<AlbumGroup>,
    epoch: CacheEpoch,
    issued: u64,
    loading: bool,
    error: Option<String>,
}

/// The library view: the current album snapshot, the open album and the
/// cover cache epoch.
pub struct LibrarySession<B: ?Sized> {
    backend: Arc<B>,
    covers: CoverResolver,
    search_limit: u32,
    state: Mutex<SessionState>,
}

impl<B> LibrarySession<B>
where
    B: TaggerBackend + ?Sized,
{
    pub fn new(backend: Arc<B>, covers: CoverResolver, search_limit: u32) -> Self {
        Self {
            backend,
            covers,
            search_limit,
            state: Mutex::new(SessionState {
                albums: Arc::new(Vec::new()),
                selected: None,
                epoch: CacheEpoch::now(),
                issued: 0,
                loading: false,
                error: None,
            }),
        }
    }

    /// Initial load when the view appears.
    pub async fn mount(&self) -> Result<RefreshOutcome> {
        debug!("Library session mounted");
        self.refresh().await
    }

    /// Drops all state. Responses still in flight will be discarded.
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        state.issued += 1;
        state.albums = Arc::new(Vec::new());
        state.selected = None;
        state.loading = false;
        state.error = None;
        debug!("Library session torn down");
    }

    pub(crate) fn backend(&self) -> Arc<B> {
        self.backend.clone()
    }

    pub fn search_limit(&self) -> u32 {
        self.search_limit
    }

    pub fn covers(&self) -> &CoverResolver {
        &self.covers
    }

    /// Rescans the library and replaces the whole snapshot. Only the most
    /// recently issued scan is applied; applying it advances the cache epoch
    /// and closes any open album.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let generation = {
            let mut state = self.state.lock();
            state.issued += 1;
            state.loading = true;
            state.error = None;
            state.issued
        };

        let response = self.backend.scan().await;

        let mut state = self.state.lock();
        if generation != state.issued {
            debug!("Discarding stale scan response (generation {})", generation);
            return Ok(RefreshOutcome::Stale);
        }
        state.loading = false;
        match response {
            Ok(albums) => {
                let albums = valid_snapshot(albums);
                let count = albums.len();
                state.albums = Arc::new(albums);
                state.selected = None;
                state.epoch = state.epoch.advance();
                info!("Library refreshed: {} albums", count);
                Ok(RefreshOutcome::Applied { albums: count })
            }
            Err(e) => {
                error!("Library scan failed: {}", e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Refresh issued once a mutation has been confirmed by the backend. The
    /// epoch moves first so covers are refetched even if the scan fails.
    pub(crate) async fn refresh_after_mutation(&self) -> Result<RefreshOutcome> {
        {
            let mut state = self.state.lock();
            state.selected = None;
            state.epoch = state.epoch.advance();
        }
        self.refresh().await
    }

    pub fn albums(&self) -> Arc<Vec<AlbumGroup>> {
        self.state.lock().albums.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn epoch(&self) -> CacheEpoch {
        self.state.lock().epoch
    }

    /// Cover address for the current epoch, or `None` when the album has no
    /// artwork.
    pub fn cover_url(&self, album: &AlbumGroup) -> Option<String> {
        album
            .has_cover
            .then(|| self.covers.resolve(&album.sample_file, Some(self.epoch())))
    }

    pub fn tiles(&self) -> Vec<AlbumTile> {
        let albums = self.albums();
        albums
            .iter()
            .map(|album| AlbumTile {
                id: album.id.clone(),
                title: album.title.clone(),
                artist: album.artist.clone(),
                year: if album.year.trim().is_empty() {
                    "Unknown".to_string()
                } else {
                    album.year.clone()
                },
                cover_url: self.cover_url(album),
            })
            .collect()
    }

    /// Marks the album with `id` in the current snapshot as open.
    pub fn select(&self, id: &str) -> Option<AlbumGroup> {
        let mut state = self.state.lock();
        let album = state.albums.iter().find(|a| a.id == id).cloned();
        state.selected = album.clone();
        album
    }

    pub fn selected(&self) -> Option<AlbumGroup> {
        self.state.lock().selected.clone()
    }

    pub fn close_detail(&self) {
        self.state.lock().selected = None;
    }

    /// Opens the detail view of an album in the current snapshot.
    pub fn open_detail(&self, id: &str) -> Option<AlbumDetail<'_, B>> {
        let album = self.select(id)?;
        Some(AlbumDetail::new(self, album))
    }
}

/// Drops albums that break the snapshot invariants: inconsistent counts, a
/// foreign sample file, or tracks already claimed by an earlier album.
fn valid_snapshot(albums: Vec<AlbumGroup>) -> Vec<AlbumGroup> {
    let mut claimed: HashSet<String> = HashSet::new();
    albums
        .into_iter()
        .filter(|album| {
            if let Err(reason) = album.validate() {
                warn!("Dropping album {} from snapshot: {:?}", album.id, reason);
                return false;
            }
            if album.tracks.iter().any(|t| claimed.contains(&t.path)) {
                warn!("Dropping album {} from snapshot: track listed twice", album.id);
                return false;
            }
            claimed.extend(album.tracks.iter().map(|t| t.path.clone()));
            true
        })
        .collect()
}
