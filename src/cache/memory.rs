//! In-process cache store

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{CacheEntry, CacheError, CacheStore};

/// Cache store that lives as long as the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry
    pub fn clear(&self) -> Result<(), CacheError> {
        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().ok()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key, value, ttl);
        self.entries
            .write()
            .map_err(|_| CacheError::Poisoned)?
            .insert(key.to_string(), entry);
        Ok(())
    }
}
