use std::sync::{Arc, OnceLock};

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::client::TaggerBackend;
use crate::error::{Result, TaggerError};
use crate::library::AlbumGroup;

pub const PREVIEW_SIZE: &str = "600x600";
pub const HIGH_RES_SIZE: &str = "10000x10000";

/// Album offered by the remote catalog as a match for a local album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCandidate")]
pub struct CatalogCandidate {
    #[serde(rename = "collectionId")]
    pub remote_id: i64,
    #[serde(rename = "artistName")]
    pub artist: String,
    #[serde(rename = "collectionName")]
    pub album: String,
    #[serde(rename = "releaseDate")]
    pub release_date: String,
    #[serde(rename = "artworkUrlPreview")]
    pub preview_artwork_url: String,
    #[serde(rename = "artworkUrlHighRes")]
    pub high_res_artwork_url: String,
}

// Shape returned by the search endpoint. The sized artwork URLs are filled in
// by the backend; older backends only return `artworkUrl100`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    collection_id: i64,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    collection_name: String,
    #[serde(default)]
    release_date: String,
    #[serde(default, rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
    #[serde(default)]
    artwork_url_preview: Option<String>,
    #[serde(default)]
    artwork_url_high_res: Option<String>,
}

impl From<RawCandidate> for CatalogCandidate {
    fn from(raw: RawCandidate) -> Self {
        let thumbnail = raw.artwork_url_100.unwrap_or_default();
        let sized = |explicit: Option<String>, size: &str| match explicit {
            Some(url) if !url.is_empty() => url,
            _ => artwork_url_for_size(&thumbnail, size),
        };
        Self {
            remote_id: raw.collection_id,
            artist: raw.artist_name,
            album: raw.collection_name,
            release_date: raw.release_date,
            preview_artwork_url: sized(raw.artwork_url_preview, PREVIEW_SIZE),
            high_res_artwork_url: sized(raw.artwork_url_high_res, HIGH_RES_SIZE),
        }
    }
}

/// Rewrites a catalog artwork URL to the requested size by replacing its
/// final path segment with `<size>bb.<ext>`.
pub fn artwork_url_for_size(artwork_url: &str, size: &str) -> String {
    if artwork_url.is_empty() {
        return String::new();
    }
    match artwork_url.rsplit_once('/') {
        Some((base, filename)) => {
            let ext = filename
                .rsplit_once('.')
                .map(|(_, ext)| format!(".{}", ext))
                .unwrap_or_default();
            format!("{}/{}bb{}", base, size, ext)
        }
        None => artwork_url.to_string(),
    }
}

fn unsafe_filename_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap())
}

impl CatalogCandidate {
    pub fn release_year(&self) -> &str {
        self.release_date.get(..4).unwrap_or("")
    }

    /// File name for saving the full size artwork.
    pub fn suggested_filename(&self) -> String {
        let name = format!("{} - {}", self.artist, self.album);
        format!("{}.jpg", unsafe_filename_chars().replace_all(&name, ""))
    }
}

/// Initial picker query for refining a known album.
pub fn seed_query(album: &AlbumGroup) -> String {
    format!("{} {}", album.artist, album.title)
}

/// Remote catalog lookups through the tagging backend.
#[derive(Debug)]
pub struct CatalogSearch<B: ?Sized> {
    backend: Arc<B>,
}

impl<B> CatalogSearch<B>
where
    B: TaggerBackend + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Results come back in the catalog's relevance order, undeduplicated.
    /// Blank queries are refused without contacting the backend.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<CatalogCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TaggerError::EmptyQuery);
        }
        debug!("Searching catalog for {:?} (limit {})", query, limit);
        self.backend.search(query, limit).await
    }
}
