//! On-disk cache store
//!
//! Provides a `DiskCache` that stores each entry as a JSON file holding the raw
//! response text and its expiry timestamps.

use async_trait::async_trait;
use chrono::Duration;
use directories::ProjectDirs;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{CacheEntry, CacheError, CacheStore};

/// Name of the store directory inside the cache root
const STORE_NAME: &str = "globalCache";

/// Manages reading and writing cache entries on disk
///
/// Entries live in an XDG-compliant cache directory
/// (`~/.cache/zhihu-daily/globalCache/` on Linux), one file per key.
#[derive(Debug, Clone)]
pub struct DiskCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Creates a new DiskCache using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "zhihu-daily")?;
        let cache_dir = project_dirs.cache_dir().join(STORE_NAME);
        Some(Self { cache_dir })
    }

    /// Creates a new DiskCache with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory holding the entry files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Removes every entry along with the store directory
    pub async fn clear(&self) -> std::io::Result<()> {
        match fs::remove_dir_all(&self.cache_dir).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Escapes a cache key into a file name
///
/// ASCII alphanumerics and `-` pass through, every other byte becomes `_XX`.
/// Distinct keys always map to distinct names.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "_{:02X}", byte);
        }
    }
    stem
}

#[async_trait]
impl CacheStore for DiskCache {
    /// Reads an entry, returning `None` if the file is missing or cannot be parsed
    async fn entry(&self, key: &str) -> Option<CacheEntry> {
        let content = fs::read_to_string(self.cache_path(key)).await.ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;
        (entry.key == key).then_some(entry)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir).await?;

        let entry = CacheEntry::new(key, value, ttl);
        let json = serde_json::to_string_pretty(&entry)?;

        fs::write(self.cache_path(key), json).await?;
        Ok(())
    }
}
