//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{cache, dashboard, status};
use crate::server::middleware::request_context_middleware;
use crate::server::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/api", get(status::api_info))
    // Dashboard endpoints
    .route("/dashboard", get(dashboard::dashboard))
    .route("/dashboard/options", get(dashboard::options))
    .route("/tables/raw", get(dashboard::raw_tables))
    .route("/schema", get(dashboard::schema))
    // Cache management
    .route("/cache/invalidate", post(cache::invalidate))
    .layer(middleware::from_fn(request_context_middleware))
    .with_state(state)
}
