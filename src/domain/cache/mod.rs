//! Cache domain - Generic caching abstraction layer

mod key;
mod repository;

pub use key::{CacheKeyGenerator, CacheKeyParams, KeyValue, Sha256KeyGenerator};
pub use repository::{Cache, CacheExt};
pub(crate) use repository::glob_to_regex;

#[cfg(test)]
pub use repository::mock::MockCache;
