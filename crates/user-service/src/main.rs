//! User Service
//!
//! Downstream service reached through the API gateway.

use common::observability::{init_tracing, LogFormat};
use tracing::{error, info};
use user_service::config::Config;
use user_service::routes;
use user_service::shutdown::shutdown_signal;

/// Default tracing filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "user_service=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse::<LogFormat>().ok())
        .unwrap_or_default();
    init_tracing(DEFAULT_LOG_FILTER, log_format);

    info!("Starting User Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let app = routes::build_routes();

    info!("User Service listening on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("User Service shutdown complete");

    Ok(())
}
