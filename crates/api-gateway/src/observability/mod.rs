//! Observability module for the API Gateway.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
