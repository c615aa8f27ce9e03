use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One audio file as reported by the backend scanner. Identity is `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub path: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub track_number: String,
}

impl Track {
    /// Position parsed from the track number tag ("3" or "3/12").
    pub fn position(&self) -> Option<u32> {
        let number = self.track_number.split('/').next()?.trim();
        match number.parse::<u32>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(n),
        }
    }
}

/// An album as grouped by the backend aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumGroup {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub year: String,
    pub track_count: usize,
    pub sample_file: String,
    #[serde(default)]
    pub has_cover: bool,
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumInvariant {
    NoTracks,
    TrackCountMismatch { track_count: usize, tracks: usize },
    SampleFileNotInTracks,
    DuplicateTrackPath(String),
}

impl AlbumGroup {
    /// Checks the invariants every album in a snapshot must hold.
    pub fn validate(&self) -> Result<(), AlbumInvariant> {
        if self.tracks.is_empty() {
            return Err(AlbumInvariant::NoTracks);
        }
        if self.track_count != self.tracks.len() {
            return Err(AlbumInvariant::TrackCountMismatch {
                track_count: self.track_count,
                tracks: self.tracks.len(),
            });
        }
        let mut seen = HashSet::new();
        for track in &self.tracks {
            if !seen.insert(track.path.as_str()) {
                return Err(AlbumInvariant::DuplicateTrackPath(track.path.clone()));
            }
        }
        if !seen.contains(self.sample_file.as_str()) {
            return Err(AlbumInvariant::SampleFileNotInTracks);
        }
        Ok(())
    }

    /// Every file belonging to the album, in discovery order.
    pub fn track_paths(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.path.clone()).collect()
    }

    pub fn year_label(&self) -> &str {
        if self.year.trim().is_empty() {
            "Unknown Year"
        } else {
            &self.year
        }
    }

    /// Track list for display: tag position when present, otherwise the
    /// 1-based discovery index.
    pub fn numbered_tracks(&self) -> Vec<(u32, &Track)> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(idx, track)| (track.position().unwrap_or(idx as u32 + 1), track))
            .collect()
    }
}
