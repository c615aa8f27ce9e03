//! Grouping of per-file tags into albums.
//!
//! The tagging backend owns aggregation; this module is the client-side
//! rendition of the same rule, used to check snapshots and to stand in for
//! the backend in tests.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::library::{AlbumGroup, Track};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Tags read from a single audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub path: String,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub year: String,
    pub genre: String,
    pub composer: String,
    pub track_number: String,
    pub has_cover: bool,
}

impl TrackTags {
    /// Album artist when tagged, otherwise the track artist.
    pub fn effective_artist(&self) -> &str {
        if self.album_artist.trim().is_empty() {
            &self.artist
        } else {
            &self.album_artist
        }
    }
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Trimmed, whitespace-collapsed, lowercased form of a grouping component.
pub fn normalize(value: &str) -> String {
    let collapsed = whitespace().replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        "unknown".to_string()
    } else {
        collapsed.to_lowercase()
    }
}

/// Album id for an (artist, album) pair.
pub fn album_id(artist: &str, album: &str) -> String {
    let raw = format!("{} - {}", normalize(artist), normalize(album));
    format!("{:x}", md5::compute(raw.as_bytes()))
}

fn display_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Groups files into albums, preserving discovery order of both albums and
/// tracks. The sample file is the first track with artwork, so `has_cover`
/// always describes the sample file.
pub fn aggregate(files: Vec<TrackTags>) -> Vec<AlbumGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut albums: HashMap<String, AlbumGroup> = HashMap::new();

    for file in files {
        let artist = file.effective_artist().to_string();
        let id = album_id(&artist, &file.album);

        let album = albums.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            AlbumGroup {
                id: id.clone(),
                title: display_or(&file.album, UNKNOWN_ALBUM),
                artist: display_or(&artist, UNKNOWN_ARTIST),
                year: file.year.clone(),
                track_count: 0,
                sample_file: file.path.clone(),
                has_cover: file.has_cover,
                tracks: Vec::new(),
                genre: non_blank(&file.genre),
                composer: non_blank(&file.composer),
            }
        });

        if file.has_cover && !album.has_cover {
            album.sample_file = file.path.clone();
            album.has_cover = true;
        }

        album.tracks.push(Track {
            path: file.path,
            title: file.title,
            artist: file.artist,
            track_number: file.track_number,
        });
        album.track_count = album.tracks.len();
    }

    order
        .into_iter()
        .filter_map(|id| albums.remove(&id))
        .collect()
}
