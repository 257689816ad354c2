//! Metric recording helpers
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! these are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

/// Record a cache hit for a result shape (list, detail, stats, ...)
pub fn record_cache_hit(shape: &'static str) {
    counter!("catalog_cache_hits_total", "shape" => shape).increment(1);
}

/// Record a cache miss for a result shape
pub fn record_cache_miss(shape: &'static str) {
    counter!("catalog_cache_misses_total", "shape" => shape).increment(1);
}

/// Record a swallowed cache failure
pub fn record_cache_error(operation: &'static str, kind: &'static str) {
    counter!(
        "catalog_cache_errors_total",
        "operation" => operation,
        "kind" => kind
    )
    .increment(1);
}

/// Record a backing store query
pub fn record_store_query(shape: &'static str, duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!("catalog_store_queries_total", "shape" => shape, "status" => status).increment(1);
    histogram!(
        "catalog_store_query_duration_seconds",
        "shape" => shape,
        "status" => status
    )
    .record(duration.as_secs_f64());
}
