//! Keyed counter/session cache.
//!
//! The login flow only needs five operations from its cache, so the
//! contract is kept that small. Implementations must make
//! [`Cache::increment_and_expire`] atomic per key; nothing above this
//! layer takes a lock.

mod memory;

pub use memory::MemoryCache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Cache errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backing store could not serve the request.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The stored value is not an integer.
    #[error("value at {0} is not an integer")]
    NotAnInteger(String),

    /// The call did not finish before its deadline.
    #[error("cache call timed out")]
    Timeout,

    /// The expiry cannot be represented from now.
    #[error("ttl of {0:?} is out of range")]
    TtlOutOfRange(Duration),
}

/// Keyed cache with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read an integer value. Absent or expired keys yield `None`.
    async fn get_int(&self, key: &str) -> Result<Option<i64>, CacheError>;

    /// Increment the integer at `key` (absent counts as zero) and reset its
    /// expiry to `ttl`. Returns the new value.
    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Store a string value with a TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Read a string value. Absent or expired keys yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}
