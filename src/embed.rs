use std::sync::Arc;

use log::{debug, error, info};
use parking_lot::Mutex;

use crate::catalog::CatalogCandidate;
use crate::client::{EmbedRequest, TaggerBackend};
use crate::error::{Result, TaggerError};
use crate::library::AlbumGroup;

/// Where the coordinator is in the pick → embed sequence. A failure returns
/// to `Idle` with the error kept in `last_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedState {
    Idle,
    Selecting { remote_id: i64 },
    Embedding { remote_id: i64 },
    Done { remote_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    /// The backend confirmed the write; the library must be refreshed.
    Embedded { remote_id: i64 },
    /// Another embed was in flight, or this one already finished.
    Ignored,
}

#[derive(Debug)]
struct Inner {
    state: EmbedState,
    last_error: Option<String>,
}

/// Sequences at most one cover embed at a time for one album detail view.
pub struct EmbedCoordinator<B: ?Sized> {
    backend: Arc<B>,
    inner: Mutex<Inner>,
}

impl<B> EmbedCoordinator<B>
where
    B: TaggerBackend + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            inner: Mutex::new(Inner {
                state: EmbedState::Idle,
                last_error: None,
            }),
        }
    }

    pub fn state(&self) -> EmbedState {
        self.inner.lock().state.clone()
    }

    /// Candidate currently being embedded, if any.
    pub fn in_flight(&self) -> Option<i64> {
        match self.inner.lock().state {
            EmbedState::Selecting { remote_id } | EmbedState::Embedding { remote_id } => {
                Some(remote_id)
            }
            EmbedState::Idle | EmbedState::Done { .. } => None,
        }
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    /// Embeds the candidate's full size artwork into every track of `album`.
    ///
    /// Returns `Ignored` without contacting the backend while another embed
    /// is in flight or after one has completed.
    pub async fn select(
        &self,
        album: &AlbumGroup,
        candidate: &CatalogCandidate,
    ) -> Result<EmbedOutcome> {
        let remote_id = candidate.remote_id;
        {
            let mut inner = self.inner.lock();
            if inner.state != EmbedState::Idle {
                debug!(
                    "Ignoring selection of {} for album {}: {:?}",
                    remote_id, album.id, inner.state
                );
                return Ok(EmbedOutcome::Ignored);
            }
            inner.state = EmbedState::Selecting { remote_id };
            inner.last_error = None;
        }

        if candidate.high_res_artwork_url.is_empty() {
            return Err(self.fail(TaggerError::MissingArtwork { remote_id }));
        }
        let request = EmbedRequest {
            file_paths: album.track_paths(),
            image_url: candidate.high_res_artwork_url.clone(),
        };

        self.inner.lock().state = EmbedState::Embedding { remote_id };
        match self.backend.embed_cover(&request).await {
            Ok(()) => {
                info!(
                    "Embedded cover {} into {} tracks of {}",
                    remote_id,
                    request.file_paths.len(),
                    album.id
                );
                self.inner.lock().state = EmbedState::Done { remote_id };
                Ok(EmbedOutcome::Embedded { remote_id })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, err: TaggerError) -> TaggerError {
        error!("Cover embed failed: {}", err);
        let mut inner = self.inner.lock();
        inner.state = EmbedState::Idle;
        inner.last_error = Some(err.user_message());
        err
    }
}
