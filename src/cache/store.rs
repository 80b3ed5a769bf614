//! Cache backend trait and in-memory implementation
//!
//! The backend surface is deliberately small: get, set with TTL, removal by
//! prefix, full clear, and a best-effort counter. Backends report failures
//! through [`CacheError`]; converting those failures into misses is the
//! job of [`super::handle::CacheHandle`], never of the backend itself.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors a cache backend may report
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage backend for the content-addressed cache.
///
/// Implementations are multiple-writer/multiple-reader with last-writer-wins
/// semantics; no transactional guarantee exists across keys.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value; `None` is a miss
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Store a value with a TTL
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;

    /// Remove a single entry
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every entry whose key starts with `prefix`; returns how many
    async fn invalidate_prefix(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Drop all entries
    async fn clear(&self) -> Result<(), CacheError>;

    /// Increment a numeric tally, creating it at 1; returns the new value
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError>;
}

struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache backend with TTL-based expiry.
///
/// Expired entries are dropped lazily on read and swept on write, so the
/// map never grows unbounded under a steady write load.
#[derive(Clone, Default)]
pub struct MemoryCache {
    data: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Check if the cache holds no live entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let now = Instant::now();
        {
            let data = self.data.read().await;
            match data.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Entry exists but is expired: drop it under the write lock
        let mut data = self.data.write().await;
        if data.get(key).is_some_and(|e| e.is_expired(now)) {
            data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut data = self.data.write().await;
        data.retain(|_, entry| !entry.is_expired(now));
        data.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut data = self.data.write().await;
        let before = data.len();
        data.retain(|key, _| !key.starts_with(prefix));
        Ok(before - data.len())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.data.write().await.clear();
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut data = self.data.write().await;
        let current = match data.get(key) {
            Some(entry) if !entry.is_expired(now) => entry.value.as_u64().unwrap_or(0),
            _ => 0,
        };
        let next = current + 1;
        data.insert(
            key.to_string(),
            Entry {
                value: Value::from(next),
                expires_at: now + ttl,
            },
        );
        Ok(next)
    }
}
