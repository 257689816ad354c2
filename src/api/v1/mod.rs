//! Versioned catalog endpoints

pub mod items;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create the catalog router; mounted under the configured API prefix
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/items", get(items::list_items))
        .route("/items/stats", get(items::get_stats))
        .route("/items/categories", get(items::list_categories))
        .route("/items/brands", get(items::list_brands))
        .route("/items/{id}", get(items::get_item))
}
