//! Release groups and torrent editions as returned by the browse endpoint.

use serde::{Deserialize, Serialize};

/// Payload of the `browse` action.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowseResponse {
    /// Current result page (1-based).
    pub current_page: u32,
    /// Total number of result pages.
    pub pages: u32,
    /// Matching release groups, in server order.
    pub results: Vec<ReleaseGroup>,
}

/// A single album/work bundling every uploaded edition of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReleaseGroup {
    /// Group ID.
    pub group_id: u64,
    /// Album name.
    pub group_name: String,
    /// Artist display name.
    pub artist: String,
    /// Cover image URL (may be empty).
    pub cover: String,
    /// Original release year.
    #[serde(alias = "year")]
    pub group_year: u32,
    /// Release type label (Album, EP, ...).
    pub release_type: String,
    /// Uploaded editions, in server order.
    pub torrents: Vec<Torrent>,
}

impl ReleaseGroup {
    /// Check whether this group is the exact (case-sensitive) match for an artist/album pair.
    pub fn matches(&self, artist: &str, album: &str) -> bool {
        self.artist == artist && self.group_name == album
    }
}

/// One uploaded torrent inside a release group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Torrent {
    /// Torrent ID, used for downloading.
    pub torrent_id: u64,
    /// Free-text quality label, e.g. "320", "V0 (VBR)", "Lossless".
    pub encoding: String,
    /// Container/codec, e.g. "MP3", "FLAC".
    pub format: String,
    /// Source medium, e.g. "CD", "WEB".
    pub media: String,
    /// Peers holding a complete copy.
    pub seeders: u32,
    /// Peers still downloading.
    pub leechers: u32,
    /// Completed downloads.
    pub snatches: u32,
    /// Total size in bytes.
    pub size: u64,
}

/// Query for the best edition of one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Artist name, compared case-sensitively.
    pub artist: String,
    /// Album name, compared case-sensitively.
    pub album: String,
}

impl SearchQuery {
    /// Create a new query.
    pub fn new<A: Into<String>, B: Into<String>>(artist: A, album: B) -> Self {
        Self {
            artist: artist.into(),
            album: album.into(),
        }
    }
}

/// The edition chosen by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedEdition {
    /// Artist name as stored by the tracker.
    pub artist: String,
    /// Album name as stored by the tracker.
    pub album: String,
    /// Cover image URL.
    pub image: String,
    /// Release year.
    pub year: u32,
    /// ID of the chosen torrent.
    pub torrent_id: u64,
    /// Encoding label of the chosen torrent.
    pub encoding: String,
}
