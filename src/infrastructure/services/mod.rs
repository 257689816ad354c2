//! Infrastructure services

mod catalog_service;

pub use catalog_service::{CatalogCacheConfig, CatalogService, DEFAULT_STORE_TIMEOUT};
