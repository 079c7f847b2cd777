//! API Gateway Library
//!
//! Single entry point for client traffic. Every request that is not served
//! by the gateway itself is authenticated with an HS256 bearer token and
//! forwarded to a dependency chosen by path prefix, carrying the verified
//! subject in `x-authenticated-subject`. Unreachable dependencies are
//! answered with a per-dependency 503 fallback.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/dispatcher.rs -> services/downstream.rs
//!                                        |
//!                                   auth/gate.rs -> common::jwt::TokenCodec
//! ```
//!
//! # Modules
//!
//! - `auth` - Credential extraction and the authentication gate
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Auth and HTTP metrics middleware
//! - `models` - Response bodies
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router and application state
//! - `services` - Route dispatcher, downstream client, fallback responder

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
