//! Cache infrastructure - backends and the fail-open store

mod factory;
mod in_memory;
mod redis;
mod store;

pub use factory::{CacheConfig, CacheFactory, CacheType};
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
pub use store::{CacheStore, DEFAULT_OPERATION_TIMEOUT};
