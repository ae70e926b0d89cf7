//! Request throttling.
//!
//! Every outbound request of one client, login included, passes through a
//! single [`RateLimiter`]. Two request starts are never closer together
//! than the configured minimum interval, no matter how many callers are
//! waiting. Waiters are served in arrival order (the inner
//! `tokio::sync::Mutex` is fair) and are only ever delayed, never rejected.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Serializes request starts to at most one per `min_interval`.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// `None` until the first request; the first request never waits.
    last_request_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new limiter.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_start: Mutex::new(None),
        }
    }

    /// Get the configured minimum interval.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may start, and claim that slot.
    ///
    /// The lock is held across the sleep so later callers queue behind
    /// this one.
    pub async fn acquire(&self) {
        let mut last = self.last_request_start.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limit delay");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Run `task` once a request slot is available.
    pub async fn schedule<F, Fut, R>(&self, task: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        self.acquire().await;
        task().await
    }
}
