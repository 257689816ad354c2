//! Layered application configuration

mod app_config;

pub use app_config::{
    ApiConfig, AppConfig, CacheSettings, CatalogConfig, DatabaseConfig, LogFormat, LoggingConfig,
    ServerConfig, TtlConfig,
};
