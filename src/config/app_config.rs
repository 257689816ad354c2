use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheConfig, CacheType};
use crate::infrastructure::services::CatalogCacheConfig;

/// Characters Redis `SCAN MATCH` treats as pattern syntax
const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '\\'];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub cache: CacheSettings,
    pub catalog: CatalogConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    /// Bound on one backing store round trip
    pub query_timeout_ms: u64,
    /// Apply schema migrations on `serve` startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    pub backend: String,
    pub url: Option<String>,
    pub key_prefix: Option<String>,
    pub max_capacity: u64,
    /// Bound on one cache round trip
    pub operation_timeout_ms: u64,
    /// Bound on the initial Redis connection
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub namespace: String,
    pub ttl: TtlConfig,
}

/// Per-shape cache lifetimes, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    pub list_secs: u64,
    pub detail_secs: u64,
    pub stats_secs: u64,
    pub categories_secs: u64,
    pub brands_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Path prefix for the catalog routes
    pub prefix: String,
    /// Include internal error messages in 5xx responses
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/catalog".to_string(),
            max_connections: 10,
            connect_timeout_secs: 10,
            query_timeout_ms: 5000,
            run_migrations: false,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheType::InMemory.to_string(),
            url: None,
            key_prefix: None,
            max_capacity: 10_000,
            operation_timeout_ms: 250,
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            namespace: "items".to_string(),
            ttl: TtlConfig::default(),
        }
    }
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            list_secs: 120,
            detail_secs: 900,
            stats_secs: 300,
            categories_secs: 3600,
            brands_secs: 3600,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api/v1".to_string(),
            expose_error_details: false,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `config/default.*`, `config/local.*`, `APP__*`
    /// variables, and finally plain `DATABASE_URL` / `REDIS_URL`
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.url", std::env::var("REDIS_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Cross-field checks that serde cannot express
    pub fn validate(&self) -> Result<(), DomainError> {
        let cache_type = self.cache.cache_type()?;

        if cache_type == CacheType::Redis && self.cache.url.is_none() {
            return Err(DomainError::configuration(
                "cache.url (or REDIS_URL) is required when cache.backend = redis",
            ));
        }

        if self.catalog.namespace.is_empty() {
            return Err(DomainError::configuration("catalog.namespace must be non-empty"));
        }

        // Both end up inside prefix-clear patterns
        for (name, value) in [
            ("catalog.namespace", Some(self.catalog.namespace.as_str())),
            ("cache.key_prefix", self.cache.key_prefix.as_deref()),
        ] {
            if value.is_some_and(|v| v.contains(GLOB_CHARS)) {
                return Err(DomainError::configuration(format!(
                    "{} must not contain any of {:?}",
                    name, GLOB_CHARS
                )));
            }
        }

        let ttl = &self.catalog.ttl;
        for (name, secs) in [
            ("list_secs", ttl.list_secs),
            ("detail_secs", ttl.detail_secs),
            ("stats_secs", ttl.stats_secs),
            ("categories_secs", ttl.categories_secs),
            ("brands_secs", ttl.brands_secs),
        ] {
            if secs == 0 {
                return Err(DomainError::configuration(format!(
                    "catalog.ttl.{} must be greater than zero",
                    name
                )));
            }
        }

        if self.database.query_timeout_ms == 0
            || self.cache.operation_timeout_ms == 0
            || self.cache.connect_timeout_ms == 0
        {
            return Err(DomainError::configuration("timeouts must be greater than zero"));
        }

        if !self.api.prefix.starts_with('/') {
            return Err(DomainError::configuration("api.prefix must start with '/'"));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl CacheSettings {
    pub fn cache_type(&self) -> Result<CacheType, DomainError> {
        self.backend.parse()
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Backend configuration; `max_ttl` bounds in-memory eviction
    pub fn to_cache_config(&self, max_ttl: Duration) -> Result<CacheConfig, DomainError> {
        let mut config = CacheConfig {
            cache_type: self.cache_type()?,
            redis_url: self.url.clone(),
            ..CacheConfig::default()
        }
        .with_max_capacity(self.max_capacity)
        .with_max_ttl(max_ttl)
        .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms));

        if let Some(prefix) = &self.key_prefix {
            config = config.with_key_prefix(prefix.clone());
        }

        Ok(config)
    }
}

impl CatalogConfig {
    pub fn to_cache_config(&self) -> CatalogCacheConfig {
        CatalogCacheConfig::default()
            .with_namespace(self.namespace.clone())
            .with_list_ttl(Duration::from_secs(self.ttl.list_secs))
            .with_detail_ttl(Duration::from_secs(self.ttl.detail_secs))
            .with_stats_ttl(Duration::from_secs(self.ttl.stats_secs))
            .with_categories_ttl(Duration::from_secs(self.ttl.categories_secs))
            .with_brands_ttl(Duration::from_secs(self.ttl.brands_secs))
    }
}
