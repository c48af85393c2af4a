//! In-process cache with per-key expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{Cache, CacheError};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    /// Fails instead of panicking when `ttl` overflows the clock, so the
    /// lock is never taken with an unrepresentable expiry.
    fn expiry(now: Instant, ttl: Duration) -> Result<Instant, CacheError> {
        now.checked_add(ttl).ok_or(CacheError::TtlOutOfRange(ttl))
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Expiring key/value cache held in process memory.
///
/// All operations take one lock over the whole map, which is what makes
/// increment-and-expire atomic. Expired entries are dropped lazily when
/// touched and in bulk by [`MemoryCache::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }

    fn live_value(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        match self.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, entry| entry.is_live(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn a background task that purges expired entries every `interval`.
    pub fn start_purge_task(self: Arc<Self>, interval: Duration) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = self.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired cache entries");
                }
            }
        });
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_int(&self, key: &str) -> Result<Option<i64>, CacheError> {
        match self.live_value(key)? {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| CacheError::NotAnInteger(key.to_string())),
            None => Ok(None),
        }
    }

    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let now = Instant::now();
        let expires_at = Entry::expiry(now, ttl)?;
        let mut entries = self.lock()?;

        let current = match entries.get(key) {
            Some(entry) if entry.is_live(now) => entry
                .value
                .parse::<i64>()
                .map_err(|_| CacheError::NotAnInteger(key.to_string()))?,
            _ => 0,
        };
        let next = current + 1;

        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Entry::expiry(Instant::now(), ttl)?;
        self.lock()?.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.live_value(key)
    }
}
