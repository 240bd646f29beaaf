//! Reuse of provider responses between analyses.
//!
//! The aggregator is throttled hard, so search, token and chart responses are kept for
//! a fixed time-to-live. Entries live in memory and, when a directory is configured,
//! also on disk as one JSON file per key so they survive between runs. Disk failures
//! only cost a cache miss.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: Value,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.stored_at < ttl,
            Err(_) => true,
        }
    }
}

/// Time-bounded store for provider responses, keyed by request.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    dir: Option<PathBuf>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ResponseCache {
    /// An in-memory cache whose entries stay fresh for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            dir: None,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Also persists entries under `dir`, which is created on first write.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The fresh value stored under `key`, if any.
    ///
    /// Entries that no longer decode as `T` are treated as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if self.is_disabled() {
            return None;
        }
        let now = Utc::now();

        let in_memory = self.entries.read().await.get(key).cloned();
        let entry = match in_memory {
            Some(entry) => entry,
            None => {
                let entry = self.read_from_disk(key).await?;
                self.entries.write().await.insert(key.to_string(), entry.clone());
                entry
            }
        };

        if !entry.is_fresh(self.ttl, now) {
            return None;
        }
        serde_json::from_value(entry.value).ok()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if self.is_disabled() {
            return;
        }
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key, error = %e, "Response not cacheable");
                return;
            }
        };
        let entry = CacheEntry { stored_at: Utc::now(), value };

        if let Some(dir) = &self.dir {
            if let Err(e) = write_entry(dir, key, &entry).await {
                tracing::warn!(key, dir = %dir.display(), error = %e, "Failed to persist cached response");
            }
        }
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Drops entries that are no longer fresh from memory.
    pub async fn clear_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries.write().await.retain(|_, entry| entry.is_fresh(ttl, now));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn read_from_disk(&self, key: &str) -> Option<CacheEntry> {
        let path = entry_path(self.dir.as_deref()?, key);
        let raw = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
                None
            }
        }
    }
}

/// One file per key; characters outside `[A-Za-z0-9-]` map to `_`.
fn entry_path(dir: &Path, key: &str) -> PathBuf {
    let name: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{name}.json"))
}

async fn write_entry(dir: &Path, key: &str, entry: &CacheEntry) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let body = serde_json::to_vec(entry)?;
    let path = entry_path(dir, key);
    // Readers never observe a partially written entry.
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, body).await?;
    tokio::fs::rename(&staging, &path).await
}
