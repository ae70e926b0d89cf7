//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default minimum gap between two request starts.
///
/// Gazelle trackers allow five API calls per ten seconds.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2000);

/// Default cookie file, relative to the working directory.
pub const DEFAULT_COOKIE_FILE: &str = "cookie.json";

/// Tunables for a client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Minimum time between the starts of two requests.
    pub min_interval: Duration,
    /// Where the session cookie is persisted.
    pub cookie_path: PathBuf,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            cookie_path: PathBuf::from(DEFAULT_COOKIE_FILE),
            user_agent: format!("gazelle/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Set the minimum interval between request starts.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Set the cookie file location.
    pub fn with_cookie_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cookie_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the user agent.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
