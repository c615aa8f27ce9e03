use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::catalog::{seed_query, CatalogCandidate, CatalogSearch};
use crate::client::TaggerBackend;
use crate::embed::{EmbedCoordinator, EmbedOutcome, EmbedState};
use crate::error::{Result, TaggerError};
use crate::library::AlbumGroup;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Applied { results: usize },
    /// A newer search was issued, or the picker closed, while this one was
    /// in flight.
    Stale,
    /// The picker is closed; nothing was sent.
    Ignored,
}

#[derive(Debug)]
struct PickerState {
    query: String,
    results: Vec<CatalogCandidate>,
    loading: bool,
    error: Option<String>,
    issued: u64,
    auto_searched: bool,
    open: bool,
}

/// Cover search and selection for one album.
pub struct CoverPicker<B: ?Sized> {
    album: AlbumGroup,
    limit: u32,
    search: CatalogSearch<B>,
    coordinator: Arc<EmbedCoordinator<B>>,
    state: Mutex<PickerState>,
}

impl<B> CoverPicker<B>
where
    B: TaggerBackend + ?Sized,
{
    /// Opens the picker with the query seeded from the album.
    pub fn open(backend: Arc<B>, album: AlbumGroup, limit: u32) -> Self {
        let coordinator = Arc::new(EmbedCoordinator::new(backend.clone()));
        Self::with_coordinator(backend, album, limit, coordinator)
    }

    /// Opens a picker that embeds through `coordinator`, so pickers opened
    /// one after another for the same album never embed concurrently.
    pub fn with_coordinator(
        backend: Arc<B>,
        album: AlbumGroup,
        limit: u32,
        coordinator: Arc<EmbedCoordinator<B>>,
    ) -> Self {
        let query = seed_query(&album);
        Self {
            album,
            limit,
            search: CatalogSearch::new(backend),
            coordinator,
            state: Mutex::new(PickerState {
                query,
                results: Vec::new(),
                loading: false,
                error: None,
                issued: 0,
                auto_searched: false,
                open: true,
            }),
        }
    }

    pub fn album(&self) -> &AlbumGroup {
        &self.album
    }

    pub fn query(&self) -> String {
        self.state.lock().query.clone()
    }

    pub fn set_query(&self, query: &str) {
        self.state.lock().query = query.to_string();
    }

    pub fn results(&self) -> Vec<CatalogCandidate> {
        self.state.lock().results.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.open = false;
        state.issued += 1;
        state.loading = false;
    }

    /// Error of the last search or embed, for display.
    pub fn error(&self) -> Option<String> {
        let search_error = self.state.lock().error.clone();
        search_error.or_else(|| self.coordinator.last_error())
    }

    pub fn embed_state(&self) -> EmbedState {
        self.coordinator.state()
    }

    /// Runs the seeded search once per picker. Later calls do nothing.
    pub async fn auto_search(&self) -> Option<Result<SearchOutcome>> {
        {
            let mut state = self.state.lock();
            if state.auto_searched || state.query.trim().is_empty() {
                return None;
            }
            state.auto_searched = true;
        }
        Some(self.search().await)
    }

    /// Searches the catalog with the current query. Only the most recently
    /// issued search may replace the results.
    pub async fn search(&self) -> Result<SearchOutcome> {
        let (query, generation) = {
            let mut state = self.state.lock();
            if !state.open {
                return Ok(SearchOutcome::Ignored);
            }
            if state.query.trim().is_empty() {
                return Err(TaggerError::EmptyQuery);
            }
            state.issued += 1;
            state.loading = true;
            state.error = None;
            (state.query.clone(), state.issued)
        };

        let response = self.search.search(&query, self.limit).await;

        let mut state = self.state.lock();
        if generation != state.issued {
            debug!("Discarding stale search response for {:?}", query);
            return Ok(SearchOutcome::Stale);
        }
        state.loading = false;
        match response {
            Ok(results) => {
                let count = results.len();
                state.results = results;
                Ok(SearchOutcome::Applied { results: count })
            }
            Err(e) => {
                warn!("Catalog search for {:?} failed: {}", query, e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Embeds the artwork of the result with `remote_id`. The picker closes
    /// once the backend confirms; on failure it stays open for a retry.
    pub async fn select(&self, remote_id: i64) -> Result<EmbedOutcome> {
        let candidate = {
            let state = self.state.lock();
            if !state.open {
                return Ok(EmbedOutcome::Ignored);
            }
            state
                .results
                .iter()
                .find(|c| c.remote_id == remote_id)
                .cloned()
        };
        let Some(candidate) = candidate else {
            debug!("No search result with id {}", remote_id);
            return Ok(EmbedOutcome::Ignored);
        };

        self.state.lock().error = None;
        let outcome = self.coordinator.select(&self.album, &candidate).await?;
        if let EmbedOutcome::Embedded { .. } = outcome {
            self.close();
        }
        Ok(outcome)
    }
}
