//! Domain layer - Core business logic and entities

pub mod cache;
pub mod catalog;
pub mod error;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, KeyValue, Sha256KeyGenerator};
pub use catalog::{
    AggregateStats, CountQuery, DistinctColumn, DistinctValues, Item, ItemPage, ItemQuery,
    ItemQueryBuilder, ItemRepository, QueryFilter, SortDirection, SortField,
};
pub use error::DomainError;
