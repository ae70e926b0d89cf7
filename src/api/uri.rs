//! Endpoint URL construction.

use std::fmt::Display;

/// Which PHP entry point a call goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointType {
    /// JSON API (`ajax.php`).
    #[default]
    Ajax,
    /// Form actions (`action.php`).
    Action,
}

impl EndpointType {
    /// Get the endpoint file name.
    pub fn filename(&self) -> &'static str {
        match self {
            EndpointType::Ajax => "ajax.php",
            EndpointType::Action => "action.php",
        }
    }
}

/// Build an endpoint URL.
///
/// The query string starts with `action=<action>` followed by each
/// parameter in the given order. Keys and values are percent-encoded.
///
/// ```
/// use gazelle::{build_uri, EndpointType};
///
/// let uri = build_uri("https://tracker.example/", EndpointType::Ajax, "browse", &[("searchstr", "rammstein")]);
/// assert_eq!(uri, "https://tracker.example/ajax.php?action=browse&searchstr=rammstein");
/// ```
pub fn build_uri<K, V>(hostname: &str, endpoint: EndpointType, action: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: Display,
{
    let mut uri = String::from(hostname);
    if !uri.ends_with('/') {
        uri.push('/');
    }
    uri.push_str(endpoint.filename());
    uri.push_str("?action=");
    uri.push_str(&urlencoding::encode(action));

    for (key, value) in params {
        uri.push('&');
        uri.push_str(&urlencoding::encode(key.as_ref()));
        uri.push('=');
        uri.push_str(&urlencoding::encode(&value.to_string()));
    }

    uri
}
