//! User Service Library
//!
//! Minimal downstream service behind the API gateway. It trusts the
//! `x-authenticated-subject` header set by the gateway and never sees the
//! caller's token.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `routes` - Axum router setup
//! - `shutdown` - SIGINT/SIGTERM handling for graceful shutdown

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod shutdown;
