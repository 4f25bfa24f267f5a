use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        // ── Series ──────────────────────────────────────────────
        .route("/api/series", get(handlers::series::get_series))
        .route("/api/series/stream", get(handlers::series::series_stream))
        // ── Service status ──────────────────────────────────────
        .route("/api/stats", get(handlers::status::get_stats))
        .route("/api/health", get(handlers::status::health))
        // ── Provide shared state to all routes above ────────────
        .with_state(state.clone());

    // ── Serve a static dashboard directory when configured ──────
    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    // ── Global middleware (applied bottom-up) ───────────────────
    router
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(axum_mw::from_fn_with_state(state, timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
