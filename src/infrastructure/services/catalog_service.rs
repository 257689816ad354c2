//! Cache-through catalog queries
//!
//! Every query shape follows the same path: derive the key, try the cache,
//! on a miss run the store query under a timeout, populate the cache with the
//! shape's TTL and return. Cached values may be up to one TTL stale; there is
//! no invalidation on write and no single-flight deduplication of misses.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::cache::{CacheKeyGenerator, CacheKeyParams, Sha256KeyGenerator};
use crate::domain::catalog::{
    total_pages, AggregateStats, DistinctColumn, DistinctValues, Item, ItemPage,
    ItemQueryBuilder, ItemRepository, QueryFilter,
};
use crate::domain::DomainError;
use crate::infrastructure::cache::CacheStore;
use crate::infrastructure::metrics::{record_cache_hit, record_cache_miss};

/// Default bound on a single backing store round trip
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Key namespace and per-shape TTLs
#[derive(Debug, Clone)]
pub struct CatalogCacheConfig {
    /// Prefix for every key this service writes
    pub namespace: String,
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
    pub stats_ttl: Duration,
    pub categories_ttl: Duration,
    pub brands_ttl: Duration,
}

impl Default for CatalogCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "items".to_string(),
            list_ttl: Duration::from_secs(120),
            detail_ttl: Duration::from_secs(900),
            stats_ttl: Duration::from_secs(300),
            categories_ttl: Duration::from_secs(3600),
            brands_ttl: Duration::from_secs(3600),
        }
    }
}

impl CatalogCacheConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_list_ttl(mut self, ttl: Duration) -> Self {
        self.list_ttl = ttl;
        self
    }

    pub fn with_detail_ttl(mut self, ttl: Duration) -> Self {
        self.detail_ttl = ttl;
        self
    }

    pub fn with_stats_ttl(mut self, ttl: Duration) -> Self {
        self.stats_ttl = ttl;
        self
    }

    pub fn with_categories_ttl(mut self, ttl: Duration) -> Self {
        self.categories_ttl = ttl;
        self
    }

    pub fn with_brands_ttl(mut self, ttl: Duration) -> Self {
        self.brands_ttl = ttl;
        self
    }

    /// Prefix shared by every key in the namespace
    pub fn key_prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Longest TTL across all shapes
    pub fn max_ttl(&self) -> Duration {
        [
            self.list_ttl,
            self.detail_ttl,
            self.stats_ttl,
            self.categories_ttl,
            self.brands_ttl,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

/// Read-only catalog queries served through the cache
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn ItemRepository>,
    cache: CacheStore,
    config: CatalogCacheConfig,
    key_generator: Sha256KeyGenerator,
    store_timeout: Duration,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl CatalogService {
    pub fn new(repository: Arc<dyn ItemRepository>, cache: CacheStore) -> Self {
        Self {
            repository,
            cache,
            config: CatalogCacheConfig::default(),
            key_generator: Sha256KeyGenerator,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_config(mut self, config: CatalogCacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn config(&self) -> &CatalogCacheConfig {
        &self.config
    }

    /// `<ns>:list:<digest>` over every filter field
    pub fn list_key(&self, filter: &QueryFilter) -> String {
        let namespace = format!("{}:list", self.config.namespace);
        self.key_generator
            .derive_key(&namespace, &filter.to_key_params())
    }

    /// `<ns>:detail:<digest>` over the id
    pub fn detail_key(&self, id: i64) -> String {
        let namespace = format!("{}:detail", self.config.namespace);
        let params = CacheKeyParams::new().with_component("id", id);
        self.key_generator.derive_key(&namespace, &params)
    }

    fn global_key(&self, shape: &str) -> String {
        format!("{}:{}", self.config.namespace, shape)
    }

    /// One page of items matching the filter, with the total match count
    pub async fn list(&self, filter: &QueryFilter) -> Result<ItemPage, DomainError> {
        let key = self.list_key(filter);

        if let Some(page) = self.lookup("list", &key).await {
            return Ok(page);
        }

        let (item_query, count_query) = ItemQueryBuilder::build(filter);
        let (data, total) = self
            .bounded("list", async {
                futures::try_join!(
                    self.repository.find_page(&item_query),
                    self.repository.count(&count_query)
                )
            })
            .await?;

        let page = ItemPage {
            data,
            total,
            page: filter.page(),
            limit: filter.limit(),
            pages: total_pages(total, filter.limit()),
        };

        self.fill(&key, &page, self.config.list_ttl).await;
        Ok(page)
    }

    /// A single item, or `None` if no item has this id
    ///
    /// Absent results are not cached.
    pub async fn get(&self, id: i64) -> Result<Option<Item>, DomainError> {
        let key = self.detail_key(id);

        if let Some(item) = self.lookup::<Item>("detail", &key).await {
            return Ok(Some(item));
        }

        let item = self
            .bounded("detail", self.repository.find_by_id(id))
            .await?;

        if let Some(item) = &item {
            self.fill(&key, item, self.config.detail_ttl).await;
        }

        Ok(item)
    }

    /// Catalog-wide aggregates, all zero for an empty catalog
    pub async fn stats(&self) -> Result<AggregateStats, DomainError> {
        let key = self.global_key("stats");

        if let Some(stats) = self.lookup("stats", &key).await {
            return Ok(stats);
        }

        let stats = self
            .bounded("stats", self.repository.aggregate_stats())
            .await?;

        self.fill(&key, &stats, self.config.stats_ttl).await;
        Ok(stats)
    }

    pub async fn categories(&self) -> Result<DistinctValues, DomainError> {
        self.distinct(DistinctColumn::Category, "categories", self.config.categories_ttl)
            .await
    }

    pub async fn brands(&self) -> Result<DistinctValues, DomainError> {
        self.distinct(DistinctColumn::Brand, "brands", self.config.brands_ttl)
            .await
    }

    /// Removes every cached entry in this service's namespace
    pub async fn invalidate_all(&self) -> usize {
        let removed = self.cache.clear_by_prefix(&self.config.key_prefix()).await;

        info!(namespace = %self.config.namespace, removed, "Cleared catalog cache");
        removed
    }

    async fn distinct(
        &self,
        column: DistinctColumn,
        shape: &'static str,
        ttl: Duration,
    ) -> Result<DistinctValues, DomainError> {
        let key = self.global_key(shape);

        if let Some(values) = self.lookup(shape, &key).await {
            return Ok(values);
        }

        let values = self
            .bounded(shape, self.repository.distinct_values(column))
            .await?;
        let values = DistinctValues::new(values);

        self.fill(&key, &values, ttl).await;
        Ok(values)
    }

    async fn lookup<V>(&self, shape: &'static str, key: &str) -> Option<V>
    where
        V: DeserializeOwned + Send,
    {
        let value = self.cache.get(key).await;

        if value.is_some() {
            debug!(shape, key = %key, "Cache hit");
            record_cache_hit(shape);
        } else {
            debug!(shape, key = %key, "Cache miss");
            record_cache_miss(shape);
        }

        value
    }

    async fn fill<V>(&self, key: &str, value: &V, ttl: Duration)
    where
        V: Serialize + Send + Sync,
    {
        if !self.cache.set(key, value, ttl).await {
            debug!(key = %key, "Result not cached");
        }
    }

    async fn bounded<T, F>(&self, shape: &'static str, query: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        debug!(shape, "Querying backing store");

        tokio::time::timeout(self.store_timeout, query)
            .await
            .map_err(|_| {
                DomainError::storage(format!(
                    "{} query timed out after {}ms",
                    shape,
                    self.store_timeout.as_millis()
                ))
            })?
    }
}
