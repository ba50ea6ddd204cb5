//! Cache module for storing raw API responses
//!
//! Entries are keyed strings with a per-entry expiry. Two stores are provided:
//! [`DiskCache`] persists entries as JSON files in an XDG-compliant cache
//! directory, and [`MemoryCache`] keeps them for the lifetime of the process.
//! Expired entries are never purged on read, they are simply reported as misses.

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when writing to a cache store
#[derive(Debug, Error)]
pub enum CacheError {
    /// Directory creation or file write failed
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry could not be serialized
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock
    #[error("Cache lock poisoned")]
    Poisoned,
}

/// A single cached value with its expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Raw response text
    pub value: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry written now that expires after `ttl`
    pub fn new(key: &str, value: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            key: key.to_string(),
            value: value.to_string(),
            cached_at: now,
            expires_at: now + ttl,
        }
    }

    /// An entry is expired once its expiry is at or before `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Key/value store with per-entry expiry
///
/// Implementations must not block the calling runtime thread. Stores are
/// shared between concurrent calls. `get` followed by `set` is not atomic: two callers that
/// both miss will both write, and the later write wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored entry for `key`, expired or not
    async fn entry(&self, key: &str) -> Option<CacheEntry>;

    /// Overwrites the entry for `key`, resetting its expiry to now + `ttl`
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Returns the cached value if present and not expired
    async fn get(&self, key: &str) -> Option<String> {
        self.entry(key)
            .await
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| entry.value)
    }
}
