//! Catch-all handler: hands every unowned path to the route dispatcher.

use crate::routes::AppState;
use axum::{
    extract::{Request, State},
    response::Response,
};
use std::sync::Arc;

/// Router fallback. Authentication, routing and forwarding happen in
/// [`RouteDispatcher::handle`](crate::services::RouteDispatcher::handle).
pub async fn dispatch(State(state): State<Arc<AppState>>, request: Request) -> Response {
    state.dispatcher.handle(request).await
}
