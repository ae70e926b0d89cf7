//! Session cookie ownership and persistence.
//!
//! [`SessionManager`] holds the login cookie for one client. The cookie is
//! mirrored into a [`CookieStore`] on every change so a later process can
//! reuse it instead of logging in again.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::rate_limit::RateLimiter;
use crate::error::{GazelleError, Result};
use crate::models::Credentials;

/// Login form endpoint, relative to the hostname.
pub(crate) const LOGIN_PATH: &str = "login.php";

/// One opaque cookie issued by the tracker.
///
/// Every field defaults, so any JSON object in the store counts as an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain attribute, if the server sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path attribute, if the server sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SessionCookie {
    /// Create a cookie with just a name and value.
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }
}

/// Authentication state of a client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Cookies to replay, in the order the server issued them.
    pub cookies: Vec<SessionCookie>,
    /// Time of the last authenticated call that succeeded with these cookies.
    pub valid_at: Option<SystemTime>,
}

impl Session {
    /// A session is present when it holds at least one cookie.
    pub fn is_present(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Render the cookies as a `Cookie` request header value.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .filter(|c| !c.name.is_empty())
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Key-value persistence for the session cookie.
pub trait CookieStore: Send + Sync + fmt::Debug {
    /// Load the stored cookies. `Ok(None)` means nothing was ever stored.
    fn load(&self) -> Result<Option<Vec<SessionCookie>>>;

    /// Replace the stored cookies.
    fn save(&self, cookies: &[SessionCookie]) -> Result<()>;
}

/// Cookie store backed by a JSON array on disk (`cookie.json` by default).
#[derive(Debug, Clone)]
pub struct FileCookieStore {
    path: PathBuf,
}

impl FileCookieStore {
    /// Create a store for the given file. The file is not touched until used.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CookieStore for FileCookieStore {
    fn load(&self) -> Result<Option<Vec<SessionCookie>>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Entries are opaque: anything that is not a cookie object still
        // counts towards presence, as a nameless cookie.
        let entries: Vec<serde_json::Value> = serde_json::from_str(&text)?;
        Ok(Some(
            entries
                .into_iter()
                .map(|entry| serde_json::from_value(entry).unwrap_or_default())
                .collect(),
        ))
    }

    fn save(&self, cookies: &[SessionCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(cookies)?)?;
        debug!(path = %self.path.display(), count = cookies.len(), "saved session cookies");
        Ok(())
    }
}

/// In-memory cookie store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryCookieStore {
    cookies: std::sync::Mutex<Option<Vec<SessionCookie>>>,
}

impl MemoryCookieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds the given cookies.
    pub fn with_cookies(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies: std::sync::Mutex::new(Some(cookies)),
        }
    }
}

impl CookieStore for MemoryCookieStore {
    fn load(&self) -> Result<Option<Vec<SessionCookie>>> {
        let cookies = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        Ok(cookies.clone())
    }

    fn save(&self, cookies: &[SessionCookie]) -> Result<()> {
        let mut stored = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        *stored = Some(cookies.to_vec());
        Ok(())
    }
}

/// Load cookies, treating an absent or unreadable store as empty.
fn load_cookies(store: &dyn CookieStore) -> Vec<SessionCookie> {
    match store.load() {
        Ok(cookies) => cookies.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring unreadable cookie store: {}", e);
            Vec::new()
        }
    }
}

/// Owns the login cookie of one client.
#[derive(Debug)]
pub struct SessionManager {
    credentials: Credentials,
    store: Arc<dyn CookieStore>,
    session: Mutex<Session>,
}

impl SessionManager {
    /// Create a manager, picking up any cookie already in the store.
    pub fn new(credentials: Credentials, store: Arc<dyn CookieStore>) -> Self {
        let cookies = load_cookies(store.as_ref());
        if !cookies.is_empty() {
            debug!(count = cookies.len(), "loaded stored session cookies");
        }

        Self {
            credentials,
            store,
            session: Mutex::new(Session {
                cookies,
                valid_at: None,
            }),
        }
    }

    /// Get the credentials used for logging in.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Check whether the store holds a non-empty cookie sequence.
    ///
    /// This says nothing about whether the server still accepts it.
    pub fn is_logged_in(&self) -> bool {
        !load_cookies(self.store.as_ref()).is_empty()
    }

    /// Get a copy of the current session.
    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Log in with the stored credentials and persist the returned cookies.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` if the server rejects the login or sets no cookie.
    pub async fn login(&self, http: &Client, limiter: &RateLimiter) -> Result<()> {
        let mut session = self.session.lock().await;
        self.login_locked(&mut session, http, limiter).await
    }

    /// Make sure a session cookie exists, logging in if needed.
    ///
    /// Returns the `Cookie` header value to send. Holding the session lock
    /// across the login means concurrent callers share a single login.
    pub async fn ensure_session(&self, http: &Client, limiter: &RateLimiter) -> Result<String> {
        let mut session = self.session.lock().await;

        if !session.is_present() {
            let stored = load_cookies(self.store.as_ref());
            if stored.is_empty() {
                self.login_locked(&mut session, http, limiter).await?;
            } else {
                debug!("Reusing stored session cookie");
                session.cookies = stored;
            }
        }

        Ok(session.cookie_header())
    }

    /// Record that an authenticated call succeeded.
    pub async fn mark_valid(&self) {
        self.session.lock().await.valid_at = Some(SystemTime::now());
    }

    /// Drop the session after the server rejected `rejected_cookie`.
    ///
    /// If another caller already replaced that cookie, nothing is cleared.
    pub async fn invalidate(&self, rejected_cookie: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.cookie_header() != rejected_cookie {
            debug!("Session already replaced, keeping it");
            return Ok(());
        }

        warn!("Session rejected by server, clearing cookie");
        session.cookies.clear();
        session.valid_at = None;
        self.store.save(&[])
    }

    async fn login_locked(
        &self,
        session: &mut Session,
        http: &Client,
        limiter: &RateLimiter,
    ) -> Result<()> {
        let mut url = self.credentials.hostname.clone();
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(LOGIN_PATH);

        let form = [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("keeplogged", "1"),
        ];

        debug!("POST {}", url);
        let response = limiter
            .schedule(|| http.post(&url).form(&form).send())
            .await?;

        let status = response.status();
        let cookies: Vec<SessionCookie> = response
            .cookies()
            .map(|c| SessionCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().map(str::to_string),
                path: c.path().map(str::to_string),
            })
            .collect();

        if !status.is_success() && !status.is_redirection() {
            return Err(GazelleError::Authentication(format!(
                "login rejected with status {}",
                status
            )));
        }
        if cookies.is_empty() {
            return Err(GazelleError::Authentication(
                "login returned no session cookie".to_string(),
            ));
        }

        self.store.save(&cookies)?;
        session.cookies = cookies;
        session.valid_at = None;

        info!(username = %self.credentials.username, "Logged in");
        Ok(())
    }
}
