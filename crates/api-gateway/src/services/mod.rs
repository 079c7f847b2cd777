//! Service layer for the API Gateway.
//!
//! # Components
//!
//! - `fallback` - Degraded responses when a dependency is unavailable
//! - `downstream` - HTTP client for forwarding to downstream services
//! - `dispatcher` - Route table and authenticated request forwarding

pub mod dispatcher;
pub mod downstream;
pub mod fallback;

pub use dispatcher::{DependencyRoute, RouteDispatcher, RouteTable, MAX_FORWARD_BODY_BYTES};
pub use downstream::{
    DownstreamClient, DownstreamError, ForwardRequest, ForwardResponse, HttpDownstreamClient,
};
pub use fallback::{FallbackResponder, FallbackResponse};

// Re-export mock for tests (unit and integration)
pub use downstream::mock::MockDownstream;

/// Dependency name of the auth service.
pub const AUTH_SERVICE: &str = "auth-service";

/// Dependency name of the user service.
pub const USER_SERVICE: &str = "user-service";
