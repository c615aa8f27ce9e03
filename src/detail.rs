use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::client::TaggerBackend;
use crate::editor::{MetadataEditor, SaveOutcome};
use crate::embed::{EmbedCoordinator, EmbedOutcome, EmbedState};
use crate::error::Result;
use crate::library::AlbumGroup;
use crate::picker::CoverPicker;
use crate::session::LibrarySession;

/// Detail view of one album of the current snapshot, with its cover picker
/// and metadata editor. Every picker it opens embeds through the same
/// coordinator, so at most one embed runs per detail view.
pub struct AlbumDetail<'s, B: ?Sized> {
    session: &'s LibrarySession<B>,
    album: AlbumGroup,
    coordinator: Arc<EmbedCoordinator<B>>,
    picker: Mutex<Option<Arc<CoverPicker<B>>>>,
    editor: Mutex<Option<Arc<MetadataEditor<B>>>>,
}

impl<'s, B> AlbumDetail<'s, B>
where
    B: TaggerBackend + ?Sized,
{
    pub(crate) fn new(session: &'s LibrarySession<B>, album: AlbumGroup) -> Self {
        Self {
            session,
            coordinator: Arc::new(EmbedCoordinator::new(session.backend())),
            album,
            picker: Mutex::new(None),
            editor: Mutex::new(None),
        }
    }

    pub fn album(&self) -> &AlbumGroup {
        &self.album
    }

    pub fn cover_url(&self) -> Option<String> {
        self.session.cover_url(&self.album)
    }

    pub fn cover_action_label(&self) -> &'static str {
        if self.album.has_cover {
            "Replace Cover"
        } else {
            "Auto-Match Cover"
        }
    }

    /// Opens the cover picker and runs its seeded search. A failed search is
    /// kept on the picker for display.
    pub async fn open_picker(&self) -> Arc<CoverPicker<B>> {
        let picker = {
            let mut slot = self.picker.lock();
            if let Some(picker) = slot.as_ref().filter(|p| p.is_open()) {
                return picker.clone();
            }
            let picker = Arc::new(CoverPicker::with_coordinator(
                self.session.backend(),
                self.album.clone(),
                self.session.search_limit(),
                self.coordinator.clone(),
            ));
            *slot = Some(picker.clone());
            picker
        };
        if let Some(Err(e)) = picker.auto_search().await {
            debug!("Seeded search for {} failed: {}", self.album.id, e);
        }
        picker
    }

    pub fn picker(&self) -> Option<Arc<CoverPicker<B>>> {
        self.picker.lock().clone()
    }

    pub fn embed_state(&self) -> EmbedState {
        self.coordinator.state()
    }

    pub fn close_picker(&self) {
        if let Some(picker) = self.picker.lock().take() {
            picker.close();
        }
    }

    /// Embeds the picked result and, once the backend confirms, refreshes
    /// the whole library.
    pub async fn choose_cover(&self, remote_id: i64) -> Result<EmbedOutcome> {
        let Some(picker) = self.picker() else {
            return Ok(EmbedOutcome::Ignored);
        };
        let outcome = picker.select(remote_id).await?;
        if let EmbedOutcome::Embedded { .. } = outcome {
            {
                let mut slot = self.picker.lock();
                if slot.as_ref().is_some_and(|p| Arc::ptr_eq(p, &picker)) {
                    slot.take();
                }
            }
            self.refresh_library().await;
        }
        Ok(outcome)
    }

    pub fn open_editor(&self) -> Arc<MetadataEditor<B>> {
        let mut slot = self.editor.lock();
        if let Some(editor) = slot.as_ref().filter(|e| e.is_open()) {
            return editor.clone();
        }
        let editor = Arc::new(MetadataEditor::open(
            self.session.backend(),
            self.album.clone(),
        ));
        *slot = Some(editor.clone());
        editor
    }

    pub fn editor(&self) -> Option<Arc<MetadataEditor<B>>> {
        self.editor.lock().clone()
    }

    pub fn close_editor(&self) {
        if let Some(editor) = self.editor.lock().take() {
            editor.close();
        }
    }

    /// Submits the editor and, once the backend confirms, refreshes the
    /// whole library.
    pub async fn save_metadata(&self) -> Result<SaveOutcome> {
        let Some(editor) = self.editor() else {
            return Ok(SaveOutcome::Ignored);
        };
        let outcome = editor.submit().await?;
        if outcome == SaveOutcome::Saved {
            self.editor.lock().take();
            self.refresh_library().await;
        }
        Ok(outcome)
    }

    // The mutation already succeeded; a failed rescan is reported by the
    // session itself.
    async fn refresh_library(&self) {
        if let Err(e) = self.session.refresh_after_mutation().await {
            warn!("Refresh after editing {} failed: {}", self.album.id, e);
        }
    }
}
