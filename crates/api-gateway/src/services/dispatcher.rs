//! Route dispatcher.
//!
//! Handles every request that is not served by the gateway itself:
//!
//! 1. Authenticate (401 on rejection, before any route lookup)
//! 2. Resolve the dependency by longest path prefix (404 when none)
//! 3. Forward with the verified subject in `x-authenticated-subject`
//! 4. Unavailable dependency: fallback 503; otherwise relay the response
//!
//! The bearer token is not forwarded. Dependencies trust the subject header
//! only because the gateway overwrites any client-supplied value.

use crate::auth::{extract_credential, AuthGate};
use crate::config::Config;
use crate::errors::GatewayError;
use crate::observability::metrics::{record_downstream_request, record_fallback_response};
use crate::services::downstream::{
    strip_hop_by_hop, DownstreamClient, DownstreamError, ForwardRequest,
};
use crate::services::fallback::FallbackResponder;
use crate::services::{AUTH_SERVICE, USER_SERVICE};
use axum::{
    body::Body,
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use common::jwt::AuthResult;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Maximum request body buffered for forwarding (2 MiB).
pub const MAX_FORWARD_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Header carrying the verified subject to dependencies.
pub const SUBJECT_HEADER: &str = "x-authenticated-subject";

/// Path prefix for the auth service.
pub const AUTH_SERVICE_PREFIX: &str = "/api/auth";

/// Path prefix for the user service.
pub const USER_SERVICE_PREFIX: &str = "/api/users";

/// One entry of the static route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRoute {
    /// Path prefix, without trailing slash (`""` matches every path).
    pub prefix: String,
    /// Dependency name, also the fallback key.
    pub dependency: String,
    /// Base URL requests are forwarded to.
    pub base_url: String,
}

impl DependencyRoute {
    pub fn new(
        prefix: impl Into<String>,
        dependency: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            dependency: dependency.into(),
            base_url: base_url.into(),
        }
    }

    /// Whether `path` falls under this prefix on a segment boundary.
    fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Static, configuration-driven route table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    // Sorted by prefix length, longest first
    routes: Vec<DependencyRoute>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<DependencyRoute>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    /// Default table: `/api/auth` and `/api/users`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            DependencyRoute::new(
                AUTH_SERVICE_PREFIX,
                AUTH_SERVICE,
                config.auth_service_url.clone(),
            ),
            DependencyRoute::new(
                USER_SERVICE_PREFIX,
                USER_SERVICE,
                config.user_service_url.clone(),
            ),
        ])
    }

    /// Longest matching route for `path`.
    pub fn resolve(&self, path: &str) -> Option<&DependencyRoute> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Dependency names, deduplicated and sorted.
    pub fn dependencies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes.iter().map(|r| r.dependency.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Authenticates and forwards requests to dependencies.
pub struct RouteDispatcher {
    gate: Arc<AuthGate>,
    routes: RouteTable,
    client: Arc<dyn DownstreamClient>,
    fallback: FallbackResponder,
}

impl RouteDispatcher {
    pub fn new(
        gate: Arc<AuthGate>,
        routes: RouteTable,
        client: Arc<dyn DownstreamClient>,
        fallback: FallbackResponder,
    ) -> Self {
        Self {
            gate,
            routes,
            client,
            fallback,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn fallback(&self) -> &FallbackResponder {
        &self.fallback
    }

    /// Handle one request end to end. Never fails; every outcome is a response.
    #[instrument(
        skip_all,
        name = "gateway.services.dispatcher.handle",
        fields(method = %request.method(), path = %request.uri().path())
    )]
    pub async fn handle(&self, request: Request) -> Response {
        let credential = extract_credential(request.headers());

        let subject = match self.gate.authenticate(credential.as_deref()) {
            AuthResult::Authenticated { subject } => subject,
            AuthResult::Rejected { reason } => {
                return GatewayError::Unauthorized(reason).into_response();
            }
        };

        let Some(route) = self.routes.resolve(request.uri().path()) else {
            tracing::debug!(target: "gateway.services.dispatcher", "No route for path");
            return GatewayError::NotFound("No route for requested path".to_string())
                .into_response();
        };

        match self.forward(route, &subject, request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn forward(
        &self,
        route: &DependencyRoute,
        subject: &str,
        request: Request,
    ) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();

        let body = axum::body::to_bytes(body, MAX_FORWARD_BODY_BYTES)
            .await
            .map_err(|e| {
                let inner = e.into_inner();
                if inner
                    .downcast_ref::<http_body_util::LengthLimitError>()
                    .is_some()
                {
                    tracing::debug!(target: "gateway.services.dispatcher", "Request body exceeds limit");
                    GatewayError::PayloadTooLarge
                } else {
                    tracing::debug!(target: "gateway.services.dispatcher", error = %inner, "Failed to read request body");
                    GatewayError::BadRequest("Failed to read request body".to_string())
                }
            })?;

        let forward_request = ForwardRequest {
            method: parts.method,
            path_and_query: parts
                .uri
                .path_and_query()
                .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string()),
            headers: forwarded_headers(&parts.headers, subject)?,
            body,
        };

        let start = Instant::now();
        let result = self.client.forward(&route.base_url, forward_request).await;
        let duration = start.elapsed();

        match result {
            Ok(downstream) => {
                let status = if downstream.status.is_client_error()
                    || downstream.status.is_server_error()
                {
                    "error"
                } else {
                    "success"
                };
                record_downstream_request(&route.dependency, status, duration);

                tracing::debug!(
                    target: "gateway.services.dispatcher",
                    dependency = %route.dependency,
                    status = %downstream.status,
                    "Forwarded request"
                );

                let mut response = Response::new(Body::from(downstream.body));
                *response.status_mut() = downstream.status;
                *response.headers_mut() = downstream.headers;
                Ok(response)
            }
            Err(DownstreamError::Unavailable(reason)) => {
                record_downstream_request(&route.dependency, "unavailable", duration);
                record_fallback_response(&route.dependency);

                tracing::warn!(
                    target: "gateway.services.dispatcher",
                    dependency = %route.dependency,
                    reason = %reason,
                    "Dependency unavailable, serving fallback"
                );

                Ok(self.fallback.respond(&route.dependency).into_response())
            }
            Err(DownstreamError::InvalidRequest(reason)) => {
                record_downstream_request(&route.dependency, "error", duration);

                tracing::error!(
                    target: "gateway.services.dispatcher",
                    dependency = %route.dependency,
                    reason = %reason,
                    "Could not build downstream request"
                );

                Err(GatewayError::BadRequest(
                    "Request could not be forwarded".to_string(),
                ))
            }
        }
    }
}

/// Headers sent downstream: client headers minus hop-by-hop entries, the
/// bearer token and any spoofed subject, plus the verified subject.
fn forwarded_headers(incoming: &HeaderMap, subject: &str) -> Result<HeaderMap, GatewayError> {
    let mut headers = strip_hop_by_hop(incoming);
    headers.remove(AUTHORIZATION);
    headers.remove(SUBJECT_HEADER);

    let value = HeaderValue::from_str(subject).map_err(|_| {
        tracing::warn!(target: "gateway.services.dispatcher", "Subject is not a valid header value");
        GatewayError::BadRequest("Authenticated subject cannot be forwarded".to_string())
    })?;
    headers.insert(HeaderName::from_static(SUBJECT_HEADER), value);

    Ok(headers)
}
