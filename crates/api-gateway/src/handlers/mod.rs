//! HTTP request handlers for the API Gateway.

pub mod auth_test;
pub mod fallback;
pub mod health;
pub mod me;
pub mod metrics;
pub mod proxy;

pub use auth_test::auth_test;
pub use fallback::fallback_handler;
pub use health::{health_check, readiness_check};
pub use me::get_me;
pub use metrics::metrics_handler;
pub use proxy::dispatch;
