//! Flat-file JSON caches
//!
//! Each cache is one JSON object on disk mapping a key to a timestamped entry.
//!
//! # Lifecycle
//! - Loaded once at construction. A missing or corrupt file starts empty.
//! - Expiry is checked lazily on lookup; expired entries are removed and the file rewritten.
//! - Every mutation rewrites the whole file (pretty-printed, via temp file + rename)
//!   through `tokio::fs`, so runtime worker threads are not blocked on disk.
//!
//! # Concurrency
//! All state sits behind a `tokio::sync::Mutex`, so one cache object is the single
//! writer for its file. Share it with `Arc` rather than opening the same path twice.

use crate::Result;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Build a stable cache key from a namespace and request parameters
///
/// Parameters are sorted by name so call-site ordering does not matter.
pub fn cache_key(namespace: &str, params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort();

    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    for (name, value) in sorted {
        hasher.update(b"|");
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Entry counts reported by `stats()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
}

trait Stamped {
    fn stamp(&self) -> DateTime<Utc>;
}

/// Shared load/expire/save machinery for both cache flavours
struct Store<E> {
    path: PathBuf,
    ttl: Duration,
    entries: Mutex<HashMap<String, E>>,
}

impl<E> Store<E>
where
    E: Stamped + Serialize + DeserializeOwned + Clone,
{
    fn open(path: PathBuf, ttl: Duration) -> Self {
        let entries = load_map(&path);
        debug!(path = %path.display(), entries = entries.len(), "Cache loaded");
        Self {
            path,
            ttl,
            entries: Mutex::new(entries),
        }
    }

    fn is_expired(&self, entry: &E, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.stamp()) > self.ttl
    }

    async fn lookup(&self, key: &str) -> Option<E> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?.clone();

        if self.is_expired(&entry, Utc::now()) {
            entries.remove(key);
            debug!(path = %self.path.display(), key, "Cache entry expired");
            if let Err(e) = save_map(&self.path, &entries).await {
                warn!(path = %self.path.display(), error = %e, "Failed to persist cache after expiry");
            }
            return None;
        }

        Some(entry)
    }

    async fn store(&self, key: String, entry: E) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key, entry);
        save_map(&self.path, &entries).await
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !self.is_expired(e, now));
        let removed = before - entries.len();
        if removed > 0 {
            save_map(&self.path, &entries).await?;
        }
        Ok(removed)
    }

    async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.entries.lock().await;
        let expired = entries.values().filter(|e| self.is_expired(e, now)).count();
        CacheStats {
            total: entries.len(),
            valid: entries.len() - expired,
            expired,
        }
    }
}

// ============================================================================
// Timed value cache
// ============================================================================

/// On-disk entry: `{ "data": ..., "timestamp": RFC3339 }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEntry<V> {
    pub data: V,
    pub timestamp: DateTime<Utc>,
}

impl<V> Stamped for TimedEntry<V> {
    fn stamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Key → value cache with a fixed time-to-live
pub struct JsonCache<V> {
    store: Store<TimedEntry<V>>,
}

impl<V> JsonCache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Open (or create on first write) the cache file at `path`
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            store: Store::open(path.into(), ttl),
        }
    }

    /// Cached value for `key`, if present and not expired
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.lookup(key).await.map(|e| e.data)
    }

    /// Insert or replace a value and persist the file
    pub async fn insert(&self, key: impl Into<String>, value: V) -> Result<()> {
        let entry = TimedEntry {
            data: value,
            timestamp: Utc::now(),
        };
        self.store.store(key.into(), entry).await
    }

    /// Remove every expired entry; returns how many were dropped
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }

    pub fn path(&self) -> &Path {
        &self.store.path
    }
}

// ============================================================================
// Negative cache
// ============================================================================

/// On-disk entry: `{ "timestamp": RFC3339, "reason": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeEntry {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

impl Stamped for NegativeEntry {
    fn stamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Store of confirmed "no data" lookups
///
/// Consulted before an external call so known-futile requests are skipped until the
/// entry's TTL lapses.
pub struct NegativeCache {
    store: Store<NegativeEntry>,
}

impl NegativeCache {
    /// Open the negative cache file with a TTL in hours
    pub fn open(path: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        // Capped at a century so the chrono duration cannot overflow
        let hours = ttl_hours.min(24 * 365 * 100) as i64;
        Self {
            store: Store::open(path.into(), Duration::hours(hours)),
        }
    }

    /// Reason recorded for `key`, if an unexpired negative entry exists
    pub async fn check(&self, key: &str) -> Option<String> {
        self.store.lookup(key).await.map(|e| e.reason)
    }

    /// Record a confirmed miss
    pub async fn record(&self, key: impl Into<String>, reason: impl Into<String>) -> Result<()> {
        let entry = NegativeEntry {
            timestamp: Utc::now(),
            reason: reason.into(),
        };
        self.store.store(key.into(), entry).await
    }

    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}

// ============================================================================
// File helpers
// ============================================================================

fn load_map<E: DeserializeOwned>(path: &Path) -> HashMap<String, E> {
    if !path.exists() {
        return HashMap::new();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(crate::Error::from)
        .and_then(|content| serde_json::from_str(&content).map_err(crate::Error::from));

    match parsed {
        Ok(map) => map,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
            HashMap::new()
        }
    }
}

/// Callers hold the store lock across the write, so renames land in mutation order.
async fn save_map<E: Serialize>(path: &Path, map: &HashMap<String, E>) -> Result<()> {
    let json = serde_json::to_string_pretty(map)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
