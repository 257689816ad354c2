use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::AppState;
use super::v1;

/// Create the full router; catalog routes are nested under `prefix`
pub fn create_router(state: AppState, prefix: &str) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check));

    // axum refuses to nest at the root
    let router = match prefix.trim_end_matches('/') {
        "" => router.merge(v1::create_v1_router()),
        prefix => router.nest(prefix, v1::create_v1_router()),
    };

    router.with_state(state).layer(TraceLayer::new_for_http())
}
