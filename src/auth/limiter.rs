//! Failed-login throttling per client.
//!
//! Counts live in the shared [`Cache`] under `attempts:<client>`. The
//! limiter is a best-effort throttle: cache failures never block a login,
//! and concurrent failures from one client may race.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::Cache;

/// Failed attempts before a client is refused.
pub const MAX_LOGIN_ATTEMPTS: i64 = 5;

/// Block window after the latest failure (15 minutes).
pub const BLOCK_WINDOW_SECS: u64 = 15 * 60;

/// Cache key prefix for attempt counters.
const ATTEMPTS_PREFIX: &str = "attempts:";

/// Tracks failed logins per client key.
#[derive(Clone)]
pub struct AttemptLimiter {
    cache: Arc<dyn Cache>,
    timeout: Duration,
}

impl AttemptLimiter {
    /// Create a limiter whose cache calls are bounded by `timeout`.
    pub fn new(cache: Arc<dyn Cache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    fn key(client_key: &str) -> String {
        format!("{ATTEMPTS_PREFIX}{client_key}")
    }

    /// Current failure count. Absent, unreadable or slow counters read as 0.
    pub async fn failures(&self, client_key: &str) -> i64 {
        let key = Self::key(client_key);
        match tokio::time::timeout(self.timeout, self.cache.get_int(&key)).await {
            Ok(Ok(count)) => count.unwrap_or(0),
            Ok(Err(e)) => {
                warn!(client = %client_key, error = %e, "Failed to read login attempts; treating as none");
                0
            }
            Err(_) => {
                warn!(client = %client_key, "Timed out reading login attempts; treating as none");
                0
            }
        }
    }

    /// Count one failure and push the counter's expiry to `block_window`
    /// from now.
    pub async fn record_failure(&self, client_key: &str, block_window: Duration) {
        let key = Self::key(client_key);
        match tokio::time::timeout(
            self.timeout,
            self.cache.increment_and_expire(&key, block_window),
        )
        .await
        {
            Ok(Ok(count)) => {
                debug!(client = %client_key, attempts = count, "Recorded failed login attempt");
            }
            Ok(Err(e)) => {
                warn!(client = %client_key, error = %e, "Failed to record login attempt");
            }
            Err(_) => {
                warn!(client = %client_key, "Timed out recording login attempt");
            }
        }
    }

    /// Forget a client's failures.
    pub async fn clear(&self, client_key: &str) {
        let key = Self::key(client_key);
        match tokio::time::timeout(self.timeout, self.cache.delete(&key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(client = %client_key, error = %e, "Failed to reset login attempts");
            }
            Err(_) => {
                warn!(client = %client_key, "Timed out resetting login attempts");
            }
        }
    }
}
