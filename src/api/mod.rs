//! Request pipeline for the Gazelle web API.
//!
//! - [`uri`]: endpoint URL construction
//! - [`rate_limit`]: the per-client request throttle
//! - [`session`]: login cookie ownership and persistence
//! - [`client`]: [`GazelleApi`], the authenticated pipeline built on the above

pub mod client;
pub mod rate_limit;
pub mod session;
pub mod uri;

pub use client::GazelleApi;
pub use rate_limit::RateLimiter;
pub use session::{CookieStore, FileCookieStore, MemoryCookieStore, Session, SessionCookie, SessionManager};
pub use uri::{build_uri, EndpointType};
