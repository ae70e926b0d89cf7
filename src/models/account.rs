//! Account credentials.

/// Login credentials and the tracker base URL.
///
/// Immutable once the client is constructed.
#[derive(Clone)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
    /// Base URL of the tracker, e.g. `https://tracker.example/`.
    pub hostname: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new<U, P, H>(username: U, password: P, hostname: H) -> Self
    where
        U: Into<String>,
        P: Into<String>,
        H: Into<String>,
    {
        Self {
            username: username.into(),
            password: password.into(),
            hostname: hostname.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("hostname", &self.hostname)
            .finish()
    }
}
