//! Catalog API
//!
//! A paginated, filterable catalog of items backed by PostgreSQL with a
//! read-through cache in front of every query shape:
//! - Deterministic cache keys derived from filter, sort and pagination
//! - Per-shape TTLs with namespace-wide invalidation
//! - Fail-open cache access (in-memory or Redis backends)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use api::state::AppState;
use config::DatabaseConfig;
use infrastructure::{
    cache::{CacheFactory, CacheStore},
    catalog::{catalog_migrations, PostgresItemRepository, PostgresMigrator},
    services::CatalogService,
};

/// Create a lazily connecting pool; connection errors surface on first use
pub fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout())
        .connect_lazy(&config.url)?;

    Ok(pool)
}

/// Apply pending catalog migrations, returning how many ran
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<usize> {
    let applied = PostgresMigrator::new(pool.clone())
        .run(&catalog_migrations())
        .await?;

    info!(applied, "Catalog migrations complete");
    Ok(applied)
}

/// Build the cache store for the configured backend
pub async fn create_cache_store(config: &AppConfig) -> anyhow::Result<CacheStore> {
    let max_ttl = config.catalog.to_cache_config().max_ttl();
    let cache_config = config.cache.to_cache_config(max_ttl)?;
    let cache = CacheFactory::new().create_or_fallback(&cache_config).await?;

    Ok(CacheStore::new(cache).with_operation_timeout(config.cache.operation_timeout()))
}

/// Wire the catalog service over an existing pool
pub async fn create_catalog_service(
    config: &AppConfig,
    pool: PgPool,
) -> anyhow::Result<CatalogService> {
    let repository = Arc::new(PostgresItemRepository::new(pool));
    let cache = create_cache_store(config).await?;

    Ok(CatalogService::new(repository, cache)
        .with_config(config.catalog.to_cache_config())
        .with_store_timeout(config.database.query_timeout()))
}

/// Create the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let pool = create_pool(&config.database)?;

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let catalog = create_catalog_service(config, pool).await?;

    info!(
        namespace = %catalog.config().namespace,
        "Catalog service initialized"
    );

    Ok(AppState::new(Arc::new(catalog)).with_error_details(config.api.expose_error_details))
}
