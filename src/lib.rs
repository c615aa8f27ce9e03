//! Client-side library workflow for the ongaku tagging backend: album
//! snapshots, cover addressing, catalog search and the embed / edit flows
//! that mutate files through the backend.

pub mod aggregate;
pub mod catalog;
pub mod client;
pub mod config;
pub mod cover;
pub mod detail;
pub mod editor;
pub mod embed;
pub mod error;
pub mod library;
pub mod logger;
pub mod picker;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{CatalogCandidate, CatalogSearch};
pub use client::{CoverImage, EmbedRequest, MetadataUpdate, TaggerBackend, TaggerClient};
pub use cover::{CacheEpoch, CoverResolver};
pub use detail::AlbumDetail;
pub use editor::{MetadataEditor, MetadataForm, SaveOutcome};
pub use embed::{EmbedCoordinator, EmbedOutcome, EmbedState};
pub use error::{Operation, TaggerError};
pub use library::{AlbumGroup, Track};
pub use picker::{CoverPicker, SearchOutcome};
pub use session::{AlbumTile, LibrarySession, RefreshOutcome};
