//! In-memory cache implementation using moka

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;

use crate::domain::cache::{glob_to_regex, Cache};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Cap applied to every per-entry TTL
    pub max_ttl: Duration,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            max_ttl: Duration::from_secs(3600),
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone)]
struct Entry {
    json: String,
    ttl: Duration,
    deadline: Instant,
}

impl Entry {
    fn new(json: &str, ttl: Duration) -> Self {
        Self {
            json: json.to_string(),
            ttl,
            deadline: Instant::now() + ttl,
        }
    }

    fn remaining(&self) -> Option<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }
}

/// Evicts each entry after its own TTL, never later than `max_ttl`
struct EntryExpiry {
    max_ttl: Duration,
}

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _at: Instant) -> Option<Duration> {
        Some(entry.ttl.min(self.max_ttl))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl.min(self.max_ttl))
    }
}

/// Process-local cache backed by moka
#[derive(Debug)]
pub struct InMemoryCache {
    entries: MokaCache<String, Entry>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryExpiry {
                max_ttl: config.max_ttl,
            })
            .build();

        Self { entries, config }
    }

    pub fn config(&self) -> &InMemoryCacheConfig {
        &self.config
    }

    /// Live entry for `key`; moka may not have evicted an expired one yet
    async fn live(&self, key: &str) -> Option<Entry> {
        self.entries
            .get(key)
            .await
            .filter(|entry| entry.remaining().is_some())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live(key).await.map(|entry| entry.json))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.entries
            .insert(key.to_string(), Entry::new(value, ttl.min(self.config.max_ttl)))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.entries.remove(key).await.is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let matcher = glob_to_regex(pattern)?;
        self.entries.run_pending_tasks().await;

        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| matcher.is_match(key))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let mut removed = 0;
        for key in matching {
            if self.entries.remove(&key).await.is_some() {
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.live(key).await.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        Ok(self.live(key).await.and_then(|entry| entry.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;
    use crate::domain::catalog::{fixtures, Item};

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("items:stats").await.unwrap();
        assert!(result.is_none());
        assert!(!cache.exists("items:stats").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_millis(50))
            .await
            .unwrap();

        assert!(cache.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_ttl_remaining() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let remaining = cache.ttl("key1").await.unwrap().unwrap();
        assert!(remaining.as_secs() > 50 && remaining.as_secs() <= 60);

        assert!(cache.ttl("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_item_round_trip() {
        let cache = InMemoryCache::new();
        let item = fixtures::item(7);

        cache
            .set("items:detail:7", &item, Duration::from_secs(60))
            .await
            .unwrap();

        let cached: Option<Item> = cache.get("items:detail:7").await.unwrap();
        assert_eq!(cached, Some(item));
    }

    #[tokio::test]
    async fn test_ttl_is_capped_by_max_ttl() {
        let cache = InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_max_ttl(Duration::from_secs(10)),
        );

        cache
            .set("items:categories", &"v", Duration::from_secs(3600))
            .await
            .unwrap();

        let remaining = cache.ttl("items:categories").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = InMemoryCache::new();

        cache
            .set("items:stats", &1, Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("items:stats", &2, Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let value: Option<i32> = cache.get("items:stats").await.unwrap();
        assert_eq!(value, Some(2));
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = InMemoryCache::new();

        for key in ["items:list:a", "items:detail:b", "other:items:c"] {
            cache
                .set(key, &"data", Duration::from_secs(60))
                .await
                .unwrap();
        }

        let deleted = cache.delete_pattern("items:*").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(!cache.exists("items:list:a").await.unwrap());
        assert!(cache.exists("other:items:c").await.unwrap());
    }

    #[test]
    fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_max_ttl(Duration::from_secs(300));

        let cache = InMemoryCache::with_config(config);

        assert_eq!(cache.config().max_capacity, 100);
        assert_eq!(cache.config().max_ttl, Duration::from_secs(300));
    }
}
