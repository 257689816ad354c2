//! Cache command - maintenance of the shared cache tier
//!
//! Unlike request serving, these commands fail when the cache cannot be
//! reached: there is no fallback backend and backend errors are returned.

use anyhow::Context;
use clap::Subcommand;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::cache::Cache;
use crate::infrastructure::cache::{CacheFactory, CacheType};
use crate::infrastructure::services::CatalogCacheConfig;

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Remove every entry under the catalog namespace
    Clear,
}

pub async fn run(command: CacheCommand) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    match command {
        CacheCommand::Clear => {
            clear(&config).await?;
        }
    }

    Ok(())
}

/// Clears the catalog namespace in the configured shared cache
async fn clear(config: &AppConfig) -> anyhow::Result<usize> {
    if config.cache.cache_type()? == CacheType::InMemory {
        warn!("In-memory cache is local to each server process; nothing shared to clear");
        return Ok(0);
    }

    let catalog = config.catalog.to_cache_config();
    let cache_config = config.cache.to_cache_config(catalog.max_ttl())?;

    let cache = CacheFactory::new()
        .create(&cache_config)
        .await
        .context("cannot reach the shared cache")?;

    let removed = clear_namespace(cache.as_ref(), &catalog).await?;
    info!(namespace = %catalog.namespace, removed, "Catalog cache cleared");

    Ok(removed)
}

/// Deletes every key under the namespace, failing on any backend error
async fn clear_namespace(cache: &dyn Cache, catalog: &CatalogCacheConfig) -> anyhow::Result<usize> {
    let pattern = format!("{}*", catalog.key_prefix());

    cache
        .delete_pattern(&pattern)
        .await
        .with_context(|| format!("failed to clear '{}'", pattern))
}
