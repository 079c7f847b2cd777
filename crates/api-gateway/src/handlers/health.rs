//! Health check handlers.
//!
//! - `/health`: liveness, returns OK while the process is running
//! - `/ready`: readiness, reports the instance and its configured dependencies

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Checks nothing; a failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// The gateway holds no connections of its own, so it is ready as soon as
/// the router serves. Dependencies are listed but not probed: an unreachable
/// dependency is answered with its fallback, not by leaving the pool.
#[tracing::instrument(skip_all, name = "gateway.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        gateway_id: state.config.gateway_id.clone(),
        dependencies: state.dispatcher.routes().dependencies(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        assert_eq!(health_check().await, "OK");
    }

    // readiness_check needs a full AppState; covered in tests/health_tests.rs
}
