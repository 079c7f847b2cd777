//! HTTP routes for the API Gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::AuthGate;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth};
use crate::services::{DownstreamClient, FallbackResponder, RouteDispatcher, RouteTable};
use axum::{middleware, routing::get, Router};
use common::clock::{Clock, SystemClock};
use common::jwt::{TokenCodec, TokenError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Router-wide request timeout.
///
/// Covers the downstream timeout (at most 300s) plus buffering; the
/// downstream client normally times out first.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(310);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token codec, the only holder of the signing key material.
    pub codec: Arc<TokenCodec>,

    /// Authentication gate shared by `require_auth` and the dispatcher.
    pub gate: Arc<AuthGate>,

    /// Dispatcher for every path the gateway does not serve itself.
    pub dispatcher: Arc<RouteDispatcher>,
}

impl AppState {
    /// Wire codec, gate and dispatcher from configuration.
    pub fn new(config: Config, client: Arc<dyn DownstreamClient>) -> Self {
        Self::with_clock(config, client, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an injected clock.
    pub fn with_clock(
        config: Config,
        client: Arc<dyn DownstreamClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::with_clock(&config.signing_key, clock));
        let gate = Arc::new(AuthGate::new(codec.clone()));
        let dispatcher = Arc::new(RouteDispatcher::new(
            gate.clone(),
            RouteTable::from_config(&config),
            client,
            FallbackResponder::from_config(&config),
        ));

        Self {
            config,
            codec,
            gate,
            dispatcher,
        }
    }

    /// Issue a token for `subject` with the configured TTL.
    pub fn issue_token(&self, subject: &str) -> Result<String, TokenError> {
        self.codec.issue(subject, self.config.token_ttl())
    }
}

/// Build the application routes.
///
/// - `/health`, `/ready`, `/metrics` - public operational endpoints
/// - `/fallback/:dependency` - public degraded response per dependency
/// - `/auth/test`, `/api/v1/me` - require a valid bearer token
/// - everything else - route dispatcher (authenticates, then forwards)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/fallback/:dependency", get(handlers::fallback_handler))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/auth/test", get(handlers::auth_test))
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_auth,
        ));

    let dispatched = Router::new()
        .fallback(handlers::dispatch)
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .merge(dispatched)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}
