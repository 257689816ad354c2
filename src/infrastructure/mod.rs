//! Infrastructure layer - cache backends, stores and services

pub mod cache;
pub mod catalog;
pub mod logging;
pub mod metrics;
pub mod services;
