//! Cached session records.
//!
//! One record per email under `session:<email>`, holding the latest token.
//! A new login overwrites the previous record; logout deletes it. Both are
//! best-effort: the token is usable without its cache copy.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheError};

/// Default session record TTL (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

const SESSION_PREFIX: &str = "session:";

/// Cache-backed session records keyed by email.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn Cache>,
    timeout: Duration,
}

impl SessionStore {
    /// Create a store whose cache calls are bounded by `timeout`.
    pub fn new(cache: Arc<dyn Cache>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    fn key(email: &str) -> String {
        format!("{SESSION_PREFIX}{email}")
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    /// Store `token` as the session for `email`.
    pub async fn store(&self, email: &str, token: &str, ttl: Duration) -> Result<(), CacheError> {
        let key = Self::key(email);
        self.bounded(self.cache.set(&key, token, ttl)).await
    }

    /// Remove the session for `email`, if any.
    pub async fn drop_session(&self, email: &str) -> Result<(), CacheError> {
        let key = Self::key(email);
        self.bounded(self.cache.delete(&key)).await
    }

    /// The stored token for `email`, if any.
    pub async fn current(&self, email: &str) -> Result<Option<String>, CacheError> {
        let key = Self::key(email);
        self.bounded(self.cache.get(&key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    const TTL: Duration = Duration::from_secs(DEFAULT_SESSION_TTL_SECS);

    fn store() -> (SessionStore, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (SessionStore::new(cache.clone(), Duration::from_secs(1)), cache)
    }

    #[tokio::test]
    async fn test_store_and_read() {
        let (sessions, cache) = store();

        sessions.store("a@x.com", "tok", TTL).await.unwrap();

        assert_eq!(sessions.current("a@x.com").await.unwrap().as_deref(), Some("tok"));
        assert_eq!(cache.get("session:a@x.com").await.unwrap().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_latest_login_wins() {
        let (sessions, _) = store();

        sessions.store("a@x.com", "phone", TTL).await.unwrap();
        sessions.store("a@x.com", "laptop", TTL).await.unwrap();

        assert_eq!(sessions.current("a@x.com").await.unwrap().as_deref(), Some("laptop"));
    }

    #[tokio::test]
    async fn test_drop_missing_session_is_ok() {
        let (sessions, _) = store();

        assert!(sessions.drop_session("nobody@x.com").await.is_ok());
        assert_eq!(sessions.current("nobody@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_expires_with_ttl() {
        let (sessions, _) = store();

        sessions
            .store("a@x.com", "tok", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(sessions.current("a@x.com").await.unwrap(), None);
    }
}
