use std::sync::Arc;

use log::{error, info};
use parking_lot::Mutex;

use crate::client::{MetadataUpdate, TaggerBackend};
use crate::error::Result;
use crate::library::AlbumGroup;

/// Album-level fields the user can edit.
///
/// `genre` and `composer` are `None` while unset: the album carried no value
/// and the user has not typed one. Unset fields are left out of the update so
/// the backend keeps whatever the files hold. Anything set, even blank, is
/// sent as-is and a blank value clears the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataForm {
    pub title: String,
    pub artist: String,
    pub year: String,
    pub genre: Option<String>,
    pub composer: Option<String>,
}

impl MetadataForm {
    pub fn seeded_from(album: &AlbumGroup) -> Self {
        Self {
            title: album.title.clone(),
            artist: album.artist.clone(),
            year: album.year.clone(),
            genre: album.genre.clone(),
            composer: album.composer.clone(),
        }
    }

    pub fn set_genre(&mut self, genre: &str) {
        self.genre = Some(genre.to_string());
    }

    pub fn set_composer(&mut self, composer: &str) {
        self.composer = Some(composer.to_string());
    }

    pub fn to_update(&self, album: &AlbumGroup) -> MetadataUpdate {
        MetadataUpdate {
            file_paths: album.track_paths(),
            artist: self.artist.clone(),
            album: self.title.clone(),
            year: self.year.clone(),
            genre: self.genre.clone(),
            composer: self.composer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The backend confirmed the write; the library must be refreshed.
    Saved,
    /// A save was already in flight or the editor was closed.
    Ignored,
}

#[derive(Debug)]
struct EditorState {
    form: MetadataForm,
    saving: bool,
    error: Option<String>,
    open: bool,
}

/// Metadata edit dialog for one album.
pub struct MetadataEditor<B: ?Sized> {
    backend: Arc<B>,
    album: AlbumGroup,
    state: Mutex<EditorState>,
}

impl<B> MetadataEditor<B>
where
    B: TaggerBackend + ?Sized,
{
    pub fn open(backend: Arc<B>, album: AlbumGroup) -> Self {
        let form = MetadataForm::seeded_from(&album);
        Self {
            backend,
            album,
            state: Mutex::new(EditorState {
                form,
                saving: false,
                error: None,
                open: true,
            }),
        }
    }

    pub fn form(&self) -> MetadataForm {
        self.state.lock().form.clone()
    }

    pub fn edit<F>(&self, apply: F)
    where
        F: FnOnce(&mut MetadataForm),
    {
        apply(&mut self.state.lock().form);
    }

    pub fn is_saving(&self) -> bool {
        self.state.lock().saving
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn close(&self) {
        self.state.lock().open = false;
    }

    /// Sends one update covering every track of the album. Closes on
    /// success; stays open with the error on failure.
    pub async fn submit(&self) -> Result<SaveOutcome> {
        let update = {
            let mut state = self.state.lock();
            if state.saving || !state.open {
                return Ok(SaveOutcome::Ignored);
            }
            state.saving = true;
            state.error = None;
            state.form.to_update(&self.album)
        };

        let response = self.backend.update_metadata(&update).await;

        let mut state = self.state.lock();
        state.saving = false;
        match response {
            Ok(()) => {
                info!(
                    "Updated metadata of {} tracks in {}",
                    update.file_paths.len(),
                    self.album.id
                );
                state.open = false;
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                error!("Metadata update for {} failed: {}", self.album.id, e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}
