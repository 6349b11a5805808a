use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::types::{FetchError, Rows};

/// Get the platform-appropriate cache directory for cmwmc-calc
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("cmwmc-calc/ranges"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/cmwmc-calc/ranges",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the on-disk range cache
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Cache key for one range of one spreadsheet
pub fn cache_key(sheet_id: &str, range: &str) -> String {
    format!("range:{}:{}", sheet_id, range)
}

/// Whether an entry fetched at `fetched_at` is still within `ttl` at `now`.
/// Entries stamped in the future count as stale.
pub fn is_fresh(fetched_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let age = now.signed_duration_since(fetched_at);
    if age < chrono::Duration::zero() {
        return false;
    }
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => age < ttl,
        Err(_) => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedRange {
    rows: Rows,
    fetched_at: DateTime<Utc>,
}

/// Time-limited cache for range reads.
///
/// Successful reads are kept in memory and, when a cache path is set, on
/// disk via cacache. Failed reads are never stored. Clones share state.
#[derive(Debug, Clone)]
pub struct RangeCache {
    inner: Arc<Mutex<HashMap<String, CachedRange>>>,
    // Entries fetched before this instant are stale regardless of TTL
    stale_before: Arc<Mutex<Option<DateTime<Utc>>>>,
    cache_path: Option<PathBuf>,
    ttl: Duration,
    enabled: bool,
}

impl RangeCache {
    /// Disk-backed cache rooted at `cache_path`
    pub fn new(cache_path: PathBuf, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            stale_before: Arc::new(Mutex::new(None)),
            cache_path: Some(cache_path),
            ttl,
            enabled: true,
        }
    }

    /// Memory-only cache
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            stale_before: Arc::new(Mutex::new(None)),
            cache_path: None,
            ttl,
            enabled: true,
        }
    }

    /// Cache that always misses (--no-cache)
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            stale_before: Arc::new(Mutex::new(None)),
            cache_path: None,
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, CachedRange>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn usable(&self, entry: &CachedRange, now: DateTime<Utc>) -> bool {
        let invalidated = self
            .stale_before
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some_and(|cutoff| entry.fetched_at < cutoff);
        !invalidated && is_fresh(entry.fetched_at, self.ttl, now)
    }

    /// Fresh rows for `key`, checking memory first and then disk
    pub fn lookup(&self, key: &str) -> Option<Rows> {
        if !self.enabled {
            return None;
        }
        let now = Utc::now();

        {
            let data = self.data();
            if let Some(entry) = data.get(key) {
                if self.usable(entry, now) {
                    return Some(entry.rows.clone());
                }
            }
        }

        let entry = self.load_from_disk(key)?;
        if !self.usable(&entry, now) {
            return None;
        }
        let rows = entry.rows.clone();
        self.data().insert(key.to_string(), entry);
        Some(rows)
    }

    /// Record a successful read
    pub fn store(&self, key: &str, rows: &Rows) {
        if !self.enabled {
            return;
        }
        let entry = CachedRange {
            rows: rows.clone(),
            fetched_at: Utc::now(),
        };

        // Disk write is best-effort; a failure only costs a refetch later
        if let Some(path) = &self.cache_path {
            match serde_json::to_vec(&entry) {
                Ok(bytes) => {
                    if let Err(e) = cacache::write_sync(path, key, &bytes) {
                        tracing::warn!("Failed to write cache entry {}: {}", key, e);
                    }
                }
                Err(e) => tracing::warn!("Failed to encode cache entry {}: {}", key, e),
            }
        }

        self.data().insert(key.to_string(), entry);
    }

    /// Return cached rows for `key` or call `on_miss` to fetch them.
    /// Only successful fetches are stored.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, on_miss: F) -> Result<Rows, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Rows, FetchError>>,
    {
        if let Some(rows) = self.lookup(key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(rows);
        }

        tracing::debug!("Cache miss: {}", key);
        let rows = on_miss().await?;
        self.store(key, &rows);
        Ok(rows)
    }

    /// Drop in-memory entries so the next lookup goes to disk
    pub fn clear_memory(&self) {
        self.data().clear();
    }

    /// Treat everything cached so far as stale, in memory and on disk.
    /// The next `get_or_fetch` for any key calls its miss callback.
    pub fn invalidate(&self) {
        self.data().clear();
        *self
            .stale_before
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    fn load_from_disk(&self, key: &str) -> Option<CachedRange> {
        let path = self.cache_path.as_ref()?;
        let bytes = cacache::read_sync(path, key).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
