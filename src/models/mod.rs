//! Data models for Gazelle API payloads.

pub mod account;
pub mod release;

pub use account::Credentials;
pub use release::{BrowseResponse, ReleaseGroup, SearchQuery, SelectedEdition, Torrent};
