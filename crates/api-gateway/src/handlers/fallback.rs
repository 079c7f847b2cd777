//! Fallback endpoint.
//!
//! Serves a dependency's degraded response directly, so operators and
//! clients can see what an outage looks like.

use crate::observability::metrics::record_fallback_response;
use crate::routes::AppState;
use crate::services::FallbackResponse;
use axum::extract::{Path, State};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /fallback/{dependency}
///
/// Always 503. Unknown names get the generic message and are recorded under
/// the `unknown` label.
#[instrument(skip_all, name = "gateway.handlers.fallback")]
pub async fn fallback_handler(
    State(state): State<Arc<AppState>>,
    Path(dependency): Path<String>,
) -> FallbackResponse {
    let responder = state.dispatcher.fallback();

    let label = if responder.knows(&dependency) {
        dependency.as_str()
    } else {
        "unknown"
    };
    record_fallback_response(label);

    responder.respond(&dependency)
}
