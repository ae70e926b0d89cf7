//! High-level Gazelle interface.

use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::info;

use crate::api::session::{CookieStore, Session};
use crate::api::uri::{self, EndpointType};
use crate::api::GazelleApi;
use crate::config::ClientConfig;
use crate::download;
use crate::error::Result;
use crate::models::{BrowseResponse, Credentials, SearchQuery, SelectedEdition};
use crate::search;

/// Main Gazelle interface.
///
/// One instance owns one session and one rate limiter; every call made
/// through it shares both.
///
/// # Example
///
/// ```rust,no_run
/// use gazelle::Gazelle;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let gazelle = Gazelle::new("user", "pass", "https://tracker.example/")?;
///
///     let edition = gazelle.search("Rammstein", "Sehnsucht").await?;
///     println!("{} ({})", edition.torrent_id, edition.encoding);
///
///     let path = gazelle.download(edition.torrent_id, "./torrents/")?.await?;
///     println!("Saved {}", path.display());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Gazelle {
    api: GazelleApi,
}

impl Gazelle {
    /// Create a client with the default configuration (`cookie.json`, 2s between requests).
    pub fn new<U, P, H>(username: U, password: P, hostname: H) -> Result<Self>
    where
        U: Into<String>,
        P: Into<String>,
        H: Into<String>,
    {
        Self::with_config(
            Credentials::new(username, password, hostname),
            ClientConfig::default(),
        )
    }

    /// Create a client with a custom configuration.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            api: GazelleApi::with_config(credentials, config)?,
        })
    }

    /// Create a client with a custom cookie store.
    pub fn with_store(
        credentials: Credentials,
        config: ClientConfig,
        store: Arc<dyn CookieStore>,
    ) -> Result<Self> {
        Ok(Self {
            api: GazelleApi::with_store(credentials, config, store)?,
        })
    }

    /// Get the underlying request pipeline.
    pub fn api(&self) -> &GazelleApi {
        &self.api
    }

    /// Check whether a session cookie is stored.
    pub fn is_logged_in(&self) -> bool {
        self.api.is_logged_in()
    }

    /// Get a copy of the current session.
    pub async fn session(&self) -> Session {
        self.api.session().await
    }

    /// Call an ajax action and return its `response` payload.
    pub async fn action<K, V>(&self, action: &str, params: &[(K, V)]) -> Result<Value>
    where
        K: AsRef<str>,
        V: Display,
    {
        self.api.action(action, params).await
    }

    /// Find the most seeded edition of an album.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no release group matches `artist` and `album`
    /// exactly.
    pub async fn search(&self, artist: &str, album: &str) -> Result<SelectedEdition> {
        self.search_query(&SearchQuery::new(artist, album)).await
    }

    /// Same as [`Gazelle::search`], taking a prepared query.
    pub async fn search_query(&self, query: &SearchQuery) -> Result<SelectedEdition> {
        let payload = self
            .api
            .action(
                "browse",
                &[
                    ("artistname", query.artist.as_str()),
                    ("groupname", query.album.as_str()),
                ],
            )
            .await?;

        let browse: BrowseResponse = serde_json::from_value(payload)?;
        let edition = search::pick(&browse.results, &query.artist, &query.album)?;

        info!(
            torrent_id = edition.torrent_id,
            encoding = %edition.encoding,
            "Found {} - {}",
            edition.artist,
            edition.album
        );
        Ok(edition)
    }

    /// Download a torrent file into `dir`.
    ///
    /// `dir` is checked before anything else: a destination that does not
    /// end with a path separator fails here, without awaiting and without
    /// any request. The returned future fetches the file and resolves to
    /// the path written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument("path cannot contain a filename")`.
    pub fn download(
        &self,
        torrent_id: u64,
        dir: &str,
    ) -> Result<impl Future<Output = Result<PathBuf>> + '_> {
        let dir = download::validate_destination(dir)?;

        Ok(async move {
            let response = self.api.send("download", &[("id", torrent_id)]).await?;
            download::persist(response, &dir).await
        })
    }

    /// Build an endpoint URL. See [`crate::build_uri`].
    pub fn build_uri<K, V>(
        hostname: &str,
        endpoint: EndpointType,
        action: &str,
        params: &[(K, V)],
    ) -> String
    where
        K: AsRef<str>,
        V: Display,
    {
        uri::build_uri(hostname, endpoint, action, params)
    }

    /// Get the torrent file name from response headers. See [`crate::extract_filename`].
    pub fn extract_filename(headers: &HeaderMap) -> Result<String> {
        download::extract_filename(headers)
    }
}
