//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis cache implementation
///
/// The `ConnectionManager` is cloned per command and reconnects on its own
/// after connection loss.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Connects to Redis, failing if the server is unreachable within the timeout
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            DomainError::cache(format!(
                "Timed out connecting to Redis after {}ms",
                config.connection_timeout.as_millis()
            ))
        })?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        prefixed(self.config.key_prefix.as_deref(), key)
    }
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}

fn command_error(operation: &str, key: &str, e: redis::RedisError) -> DomainError {
    DomainError::cache(format!("Redis {} failed for '{}': {}", operation, key, e))
}

/// Keys scanned per SCAN round trip
const SCAN_BATCH: usize = 100;

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        conn.get(self.prefix_key(key))
            .await
            .map_err(|e| command_error("GET", key, e))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        // EX takes whole seconds and rejects zero
        conn.set_ex(self.prefix_key(key), value, ttl.as_secs().max(1))
            .await
            .map_err(|e| command_error("SET", key, e))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: usize = conn
            .del(self.prefix_key(key))
            .await
            .map_err(|e| command_error("DEL", key, e))?;

        Ok(removed > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let matching = self.prefix_key(pattern);
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut removed = 0usize;

        // SCAN rather than KEYS so large keyspaces don't block the server.
        // Each page is deleted before the next is fetched.
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&matching)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| command_error("SCAN", pattern, e))?;

            if !keys.is_empty() {
                let page: usize = conn
                    .del(&keys)
                    .await
                    .map_err(|e| command_error("DEL", pattern, e))?;
                removed += page;
            }

            if next == 0 {
                return Ok(removed);
            }
            cursor = next;
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        conn.exists(self.prefix_key(key))
            .await
            .map_err(|e| command_error("EXISTS", key, e))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let mut conn = self.connection.clone();

        let remaining: i64 = conn
            .ttl(self.prefix_key(key))
            .await
            .map_err(|e| command_error("TTL", key, e))?;

        // -2: missing key, -1: no expiry
        Ok(u64::try_from(remaining).ok().map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    // These tests require a running Redis instance: cargo test -- --ignored

    fn get_test_config() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:6379").with_key_prefix("catalog-test")
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_round_trip_with_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("key1", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));

        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_delete_pattern() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        for key in ["items:list:a", "items:list:b", "keep:c"] {
            cache.set(key, &"v", Duration::from_secs(60)).await.unwrap();
        }

        let deleted = cache.delete_pattern("items:*").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(cache.exists("keep:c").await.unwrap());

        cache.delete("keep:c").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_ttl() {
        let cache = RedisCache::new(get_test_config()).await.unwrap();

        cache
            .set("ttl_key", &"value1", Duration::from_secs(60))
            .await
            .unwrap();

        let ttl = cache.ttl("ttl_key").await.unwrap();
        assert!(ttl.unwrap().as_secs() > 50);

        cache.delete("ttl_key").await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_fast() {
        let config = RedisCacheConfig::new("redis://127.0.0.1:1")
            .with_connection_timeout(Duration::from_millis(500));

        let result = RedisCache::new(config).await;
        assert!(matches!(result, Err(DomainError::Cache { .. })));
    }

    #[test]
    fn test_command_error_names_operation_and_key() {
        let err = command_error(
            "GET",
            "items:stats",
            redis::RedisError::from((redis::ErrorKind::IoError, "connection reset")),
        );

        let message = err.to_string();
        assert!(matches!(err, DomainError::Cache { .. }));
        assert!(message.contains("GET"));
        assert!(message.contains("items:stats"));
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(prefixed(Some("app"), "items:stats"), "app:items:stats");
        assert_eq!(prefixed(None, "items:stats"), "items:stats");
    }
}
