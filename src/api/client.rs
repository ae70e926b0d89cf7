//! Authenticated request pipeline.
//!
//! [`GazelleApi`] ties together URL building, the shared [`RateLimiter`]
//! and the [`SessionManager`]. Every request of a client goes through it.

use std::fmt::Display;
use std::sync::Arc;

use reqwest::header::{COOKIE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api::rate_limit::RateLimiter;
use crate::api::session::{CookieStore, FileCookieStore, Session, SessionManager, LOGIN_PATH};
use crate::api::uri::{build_uri, EndpointType};
use crate::config::ClientConfig;
use crate::error::{GazelleError, Result};
use crate::models::Credentials;

/// Position of a logical call in the re-login cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Sent with the existing (or just created) session.
    First,
    /// Sent once more after the server rejected the first session.
    AfterRelogin,
}

/// Low-level client for a Gazelle tracker's JSON API.
///
/// # Example
///
/// ```rust,no_run
/// use gazelle::{Credentials, GazelleApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = GazelleApi::new(Credentials::new("user", "pass", "https://tracker.example/"))?;
///     let index = api.action("index", &[] as &[(&str, &str)]).await?;
///     println!("{}", index);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct GazelleApi {
    http: Client,
    limiter: RateLimiter,
    session: SessionManager,
}

impl GazelleApi {
    /// Create a client with the default configuration.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_config(credentials, ClientConfig::default())
    }

    /// Create a client whose cookie lives in `config.cookie_path`.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let store = Arc::new(FileCookieStore::new(&config.cookie_path));
        Self::with_store(credentials, config, store)
    }

    /// Create a client with a custom cookie store.
    pub fn with_store(
        credentials: Credentials,
        config: ClientConfig,
        store: Arc<dyn CookieStore>,
    ) -> Result<Self> {
        // Redirects stay visible: login answers with a redirect carrying the
        // cookie, and an expired session is bounced to the login page.
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            limiter: RateLimiter::new(config.min_interval),
            session: SessionManager::new(credentials, store),
        })
    }

    /// Get the tracker base URL.
    pub fn hostname(&self) -> &str {
        &self.session.credentials().hostname
    }

    /// Check whether a session cookie is stored.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Log in unconditionally and persist the new cookie.
    pub async fn login(&self) -> Result<()> {
        self.session.login(&self.http, &self.limiter).await
    }

    /// Get a copy of the current session.
    pub async fn session(&self) -> Session {
        self.session.snapshot().await
    }

    /// Call an ajax action and return its `response` payload.
    ///
    /// # Errors
    ///
    /// Returns `Api` if the server answers with a failure status or a body
    /// that is not JSON, and `Authentication` if the session cannot be
    /// established.
    pub async fn action<K, V>(&self, action: &str, params: &[(K, V)]) -> Result<Value>
    where
        K: AsRef<str>,
        V: Display,
    {
        let response = self.send(action, params).await?;
        let status = response.status();
        let text = response.text().await?;
        parse_envelope(status, &text)
    }

    /// Send an authenticated GET to an ajax action and return the raw response.
    ///
    /// Logs in first if there is no session. If the server rejects the
    /// session, it is cleared and the request is sent exactly once more
    /// after a fresh login.
    pub async fn send<K, V>(&self, action: &str, params: &[(K, V)]) -> Result<Response>
    where
        K: AsRef<str>,
        V: Display,
    {
        let uri = build_uri(self.hostname(), EndpointType::Ajax, action, params);
        let mut attempt = Attempt::First;

        loop {
            let cookie = self.session.ensure_session(&self.http, &self.limiter).await?;

            debug!("GET {}", uri);
            let response = self
                .limiter
                .schedule(|| self.http.get(&uri).header(COOKIE, cookie.as_str()).send())
                .await?;

            if !is_session_rejected(&response) {
                self.session.mark_valid().await;
                return Ok(response);
            }

            self.session.invalidate(&cookie).await?;
            match attempt {
                Attempt::First => {
                    warn!(action, status = %response.status(), "Session rejected, logging in again");
                    attempt = Attempt::AfterRelogin;
                }
                Attempt::AfterRelogin => {
                    return Err(GazelleError::Authentication(format!(
                        "session rejected after re-login (status {})",
                        response.status()
                    )));
                }
            }
        }
    }
}

/// Check whether a response means the session is no longer accepted.
fn is_session_rejected(response: &Response) -> bool {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }

    status.is_redirection()
        && response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|location| location.contains(LOGIN_PATH))
}

/// Unwrap the `{"status": ..., "response": ...}` envelope of an ajax reply.
pub(crate) fn parse_envelope(status: StatusCode, text: &str) -> Result<Value> {
    let body: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let preview: String = text.chars().take(500).collect();
            error!("Failed to parse API response (status {}): {}", status, preview);
            return Err(GazelleError::Api(format!(
                "invalid JSON response (status {}): {}",
                status, e
            )));
        }
    };

    match body.get("status").and_then(|s| s.as_str()) {
        Some("success") => Ok(body.get("response").cloned().unwrap_or(Value::Null)),
        other => {
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("unexpected status {:?}", other.unwrap_or("missing")));
            error!("Gazelle API error: {}", message);
            Err(GazelleError::Api(message))
        }
    }
}
