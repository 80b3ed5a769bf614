//! Fail-open cache access
//!
//! [`CacheHandle`] is the only cache surface the rest of the engine sees.
//! Every backend failure is converted into a miss or no-op here, at the call
//! boundary, so callers complete with a fresh computation instead of an
//! error. A handle can also be constructed with no backend at all, which
//! behaves as a permanently cold cache.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::keys;
use super::store::{CacheBackend, DEFAULT_TTL};

/// Shared, fail-open view over an optional cache backend
#[derive(Clone)]
pub struct CacheHandle {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl CacheHandle {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A handle with no backend: every get misses, every write is a no-op
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Check whether a backend is attached
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Fetch and deserialize a cached value; any failure is a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;
        let value = match backend.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                debug!("cache get failed for {key}: {e}");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!("cache entry for {key} did not deserialize: {e}");
                None
            }
        }
    }

    /// Serialize and store a value; failures are dropped
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                debug!("cache value for {key} did not serialize: {e}");
                return;
            }
        };
        if let Err(e) = backend.set(key, value, ttl.unwrap_or(DEFAULT_TTL)).await {
            debug!("cache set failed for {key}: {e}");
        }
    }

    /// Remove all entries under a key prefix
    pub async fn invalidate(&self, prefix: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        match backend.invalidate_prefix(prefix).await {
            Ok(removed) => debug!("invalidated {removed} cache entries under {prefix}"),
            Err(e) => debug!("cache invalidation failed for {prefix}: {e}"),
        }
    }

    /// Drop every cache entry
    pub async fn clear_all(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.clear().await {
            debug!("cache clear failed: {e}");
        }
    }

    /// Best-effort, eventually-consistent usage tally for a pattern.
    ///
    /// Not a source of truth: the authoritative count lives on the pattern
    /// record itself.
    pub async fn increment_pattern_usage(&self, pattern_id: &str) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let key = keys::pattern_usage_key(pattern_id);
        if let Err(e) = backend.increment(&key, DEFAULT_TTL).await {
            debug!("pattern usage increment failed for {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{CacheError, MemoryCache};
    use async_trait::async_trait;
    use serde_json::Value;

    /// Backend that simulates an unavailable cache service
    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> Result<Option<Value>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn invalidate_prefix(&self, _prefix: &str) -> Result<usize, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn increment(&self, _key: &str, _ttl: Duration) -> Result<u64, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn down_backend_degrades_to_miss_and_noop() {
        let handle = CacheHandle::new(Arc::new(DownBackend));
        assert_eq!(handle.get::<u32>("k").await, None);
        handle.set("k", &42u32, None).await;
        handle.invalidate("k").await;
        handle.clear_all().await;
        handle.increment_pattern_usage("p1").await;
        // Still a miss after the failed write
        assert_eq!(handle.get::<u32>("k").await, None);
    }

    #[tokio::test]
    async fn disabled_handle_is_permanently_cold() {
        let handle = CacheHandle::disabled();
        assert!(!handle.is_enabled());
        handle.set("k", &1u8, None).await;
        assert_eq!(handle.get::<u8>("k").await, None);
    }

    #[tokio::test]
    async fn typed_roundtrip_through_memory_backend() {
        let handle = CacheHandle::new(Arc::new(MemoryCache::new()));
        handle.set("nums", &vec![1u64, 2, 3], None).await;
        assert_eq!(handle.get::<Vec<u64>>("nums").await, Some(vec![1, 2, 3]));

        // A type mismatch is a miss, not an error
        assert_eq!(handle.get::<String>("nums").await, None);
    }
}
