//! Fail-open cache access
//!
//! [`CacheStore`] wraps any [`Cache`] backend so callers never see a cache
//! error. Reads that fail, time out or return an undecodable entry are
//! misses. Writes and deletes that fail report `false`. Every failure is
//! logged and counted in [`CacheStore::recover`] and nowhere else.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::DomainError;
use crate::infrastructure::metrics::record_cache_error;

/// Default bound on a single cache operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_millis(250);

/// Cache facade that degrades to "no cache" instead of failing
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache: Arc<dyn Cache>,
    operation_timeout: Duration,
}

impl CacheStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Returns the cached value, or `None` on a miss or any failure
    pub async fn get<V>(&self, key: &str) -> Option<V>
    where
        V: DeserializeOwned + Send,
    {
        let value = self.guard("get", key, self.cache.get::<V>(key)).await;
        value.flatten()
    }

    /// Stores a value with a TTL; `false` if the write did not happen
    pub async fn set<V>(&self, key: &str, value: &V, ttl: Duration) -> bool
    where
        V: Serialize + Send + Sync,
    {
        self.guard("set", key, self.cache.set(key, value, ttl))
            .await
            .is_some()
    }

    /// Removes a key; `false` if it was absent or the delete failed
    pub async fn delete(&self, key: &str) -> bool {
        self.guard("delete", key, self.cache.delete(key))
            .await
            .unwrap_or(false)
    }

    /// Removes every key starting with `prefix`, returning how many were removed
    pub async fn clear_by_prefix(&self, prefix: &str) -> usize {
        let pattern = format!("{}*", prefix);

        self.guard("clear", &pattern, self.cache.delete_pattern(&pattern))
            .await
            .unwrap_or(0)
    }

    async fn guard<T, F>(&self, operation: &'static str, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.recover(operation, key, &error);
                None
            }
            Err(_) => {
                let error = DomainError::cache(format!(
                    "operation timed out after {}ms",
                    self.operation_timeout.as_millis()
                ));
                self.recover(operation, key, &error);
                None
            }
        }
    }

    fn recover(&self, operation: &'static str, key: &str, error: &DomainError) {
        let kind = match error {
            DomainError::Serialization { .. } => "decode",
            _ => "backend",
        };

        warn!(
            operation = operation,
            key = %key,
            kind = kind,
            error = %error,
            "Cache operation failed, continuing without cache"
        );
        record_cache_error(operation, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::infrastructure::cache::InMemoryCache;

    fn store(cache: Arc<dyn Cache>) -> CacheStore {
        CacheStore::new(cache).with_operation_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_round_trip_through_healthy_backend() {
        let store = store(Arc::new(InMemoryCache::new()));

        assert!(store.set("k", &vec![1, 2, 3], Duration::from_secs(60)).await);

        let value: Option<Vec<i32>> = store.get("k").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert!(store.delete("k").await);
        assert!(!store.delete("k").await);
    }

    #[tokio::test]
    async fn test_backend_error_is_a_miss() {
        let cache = Arc::new(MockCache::new().with_error("connection refused"));
        let store = store(cache.clone());

        let value: Option<String> = store.get("k").await;
        assert!(value.is_none());
        assert!(!store.set("k", &"v", Duration::from_secs(60)).await);
        assert!(!store.delete("k").await);
        assert_eq!(store.clear_by_prefix("items:").await, 0);
        assert_eq!(cache.calls(), 4);
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_as_miss() {
        let cache = Arc::new(MockCache::new().with_delay(Duration::from_millis(500)));
        let store = store(cache);

        let started = std::time::Instant::now();
        let value: Option<String> = store.get("k").await;

        assert!(value.is_none());
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = Arc::new(MockCache::new().with_raw_entry("k", "{not json"));
        let store = store(cache);

        let value: Option<Vec<i32>> = store.get("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_entry_is_a_miss() {
        let cache = Arc::new(MockCache::new().with_raw_entry("k", "\"a string\""));
        let store = store(cache);

        let value: Option<Vec<i32>> = store.get("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_recovers_once_backend_heals() {
        let cache = Arc::new(MockCache::new().with_error("down"));
        let store = store(cache.clone());

        assert!(!store.set("k", &1u32, Duration::from_secs(60)).await);

        cache.set_error(None);
        assert!(store.set("k", &1u32, Duration::from_secs(60)).await);
        assert_eq!(store.get::<u32>("k").await, Some(1));
    }

    #[tokio::test]
    async fn test_clear_by_prefix() {
        let store = store(Arc::new(InMemoryCache::new()));

        for key in ["items:list:a", "items:stats", "users:1"] {
            store.set(key, &"v", Duration::from_secs(60)).await;
        }

        assert_eq!(store.clear_by_prefix("items:").await, 2);
        assert_eq!(store.get::<String>("users:1").await.as_deref(), Some("v"));
    }
}
