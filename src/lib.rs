//! # Gazelle
//!
//! A client for the JSON API of Gazelle-based private trackers.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through the [`Gazelle`] struct:
//!
//! ```rust,no_run
//! use gazelle::Gazelle;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gazelle = Gazelle::new("username", "password", "https://tracker.example/")?;
//!
//!     // Pick the most seeded edition of an album
//!     let edition = gazelle.search("Rammstein", "Sehnsucht").await?;
//!     println!("{} {} -> torrent {}", edition.artist, edition.album, edition.torrent_id);
//!
//!     // Save its .torrent file
//!     let path = gazelle.download(edition.torrent_id, "./torrents/")?.await?;
//!     println!("Saved: {}", path.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Behavior
//!
//! - Logs in on first use and keeps the session cookie in `cookie.json`,
//!   so later runs reuse it.
//! - If the server rejects the session, logs in again and retries once.
//! - Spaces request starts at least 2 seconds apart (configurable through
//!   [`ClientConfig`]), including the login request.
//! - There is no request timeout unless one is configured.
//!
//! ## Low-Level APIs
//!
//! - [`GazelleApi`] - Authenticated request pipeline
//! - [`build_uri`] / [`extract_filename`] - Pure helpers

pub mod api;
pub mod config;
pub mod download;
pub mod error;
mod gazelle;
pub mod models;
pub mod search;

// Main interface (recommended)
pub use gazelle::Gazelle;

// Low-level APIs
pub use api::{build_uri, CookieStore, EndpointType, FileCookieStore, GazelleApi, MemoryCookieStore};
pub use config::ClientConfig;
pub use download::extract_filename;
pub use error::{GazelleError, Result};
pub use models::{Credentials, ReleaseGroup, SearchQuery, SelectedEdition, Torrent};
