//! HTTP routes for the User Service.

use crate::handlers;
use axum::{routing::get, Router};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes.
///
/// - `/health` - liveness
/// - `/api/users/test` - reachability probe
/// - `/api/users/me` - echo of the propagated subject
pub fn build_routes() -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/users/test", get(handlers::users_test))
        .route("/api/users/me", get(handlers::users_me))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
