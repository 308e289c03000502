//! Filesystem response cache
//!
//! One file per entry, named `<sha256>.json`, holding
//! `{timestamp, url, data}` with the timestamp in milliseconds since
//! epoch. Entries older than the TTL are treated as misses. Writes are
//! last-writer-wins; read and write failures degrade to cache misses.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Milliseconds since epoch at write time
    timestamp: i64,
    url: String,
    data: serde_json::Value,
}

/// Directory-backed response cache
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    /// Open the cache directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, ttl })
    }

    /// SHA-256 of the URL plus (for POST) the canonicalized body
    pub fn cache_key(url: &str, body: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        if let Some(body) = body {
            hasher.update(body.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Fetch a cached payload; stale or unreadable entries are misses
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let path = self.entry_path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache read failed");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache entry");
                return None;
            }
        };

        let age_ms = chrono::Utc::now().timestamp_millis() - entry.timestamp;
        if age_ms < 0 || age_ms as u128 > self.ttl.as_millis() {
            debug!(key, age_ms, "Cache entry expired");
            return None;
        }

        Some(entry.data)
    }

    /// Store a payload; failures are logged and ignored
    pub fn put(&self, key: &str, url: &str, data: &serde_json::Value) {
        let entry = CacheEntry {
            timestamp: chrono::Utc::now().timestamp_millis(),
            url: url.to_string(),
            data: data.clone(),
        };
        let path = self.entry_path(key);
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(path = %path.display(), error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "Cache entry serialization failed"),
        }
    }

    /// Delete every entry, returning the number removed
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Entry count and total size in bytes
    pub fn stats(&self) -> Result<(usize, u64)> {
        let mut count = 0;
        let mut bytes = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
                bytes += entry.metadata()?.len();
            }
        }
        Ok((count, bytes))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache(ttl: Duration) -> (tempfile::TempDir, ResponseCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path(), ttl).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_key_is_stable_and_body_sensitive() {
        let a = ResponseCache::cache_key("https://api.example.org/works", None);
        let b = ResponseCache::cache_key("https://api.example.org/works", None);
        let c = ResponseCache::cache_key("https://api.example.org/works", Some(r#"{"ids":[]}"#));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_roundtrip() {
        let (_dir, cache) = test_cache(Duration::from_secs(60));
        let key = ResponseCache::cache_key("https://x.test/1", None);
        let payload = serde_json::json!({"results": [1, 2, 3]});

        assert!(cache.get(&key).is_none());
        cache.put(&key, "https://x.test/1", &payload);
        assert_eq!(cache.get(&key), Some(payload));
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let (_dir, cache) = test_cache(Duration::ZERO);
        let key = ResponseCache::cache_key("https://x.test/2", None);
        cache.put(&key, "https://x.test/2", &serde_json::json!(1));
        // TTL of zero expires immediately
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let (_dir, cache) = test_cache(Duration::from_secs(60));
        let key = ResponseCache::cache_key("https://x.test/3", None);
        std::fs::write(cache.entry_path(&key), "not json").unwrap();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_clear_and_stats() {
        let (_dir, cache) = test_cache(Duration::from_secs(60));
        for i in 0..3 {
            let key = ResponseCache::cache_key(&format!("https://x.test/{i}"), None);
            cache.put(&key, "u", &serde_json::json!(i));
        }
        let (count, bytes) = cache.stats().unwrap();
        assert_eq!(count, 3);
        assert!(bytes > 0);

        assert_eq!(cache.clear().unwrap(), 3);
        assert_eq!(cache.stats().unwrap().0, 0);
    }
}
