//! Test server harness for E2E testing
//!
//! Provides `TestGatewayServer` for spawning real gateway instances in tests.

use api_gateway::config::Config;
use api_gateway::observability::metrics::init_metrics_recorder;
use api_gateway::routes::{self, AppState};
use api_gateway::services::HttpDownstreamClient;
use common::clock::{Clock, FixedClock, SystemClock};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

use crate::keys::TEST_SIGNING_KEY_B64;

/// Downstream URL that refuses connections (port 9 is discard, normally closed).
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Global metrics handle shared by every server in the test process.
///
/// The Prometheus recorder can only be installed once per process.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Options for [`TestGatewayServer::spawn_with`].
#[derive(Default)]
pub struct TestGatewayOptions {
    /// Base URL for `/api/auth` (default: unreachable).
    pub auth_service_url: Option<String>,
    /// Base URL for `/api/users` (default: unreachable).
    pub user_service_url: Option<String>,
    /// Clock for token issue and verification (default: system clock).
    pub clock: Option<Arc<dyn Clock>>,
    /// Extra environment variables passed to `Config::from_vars`.
    pub extra_vars: Vec<(String, String)>,
}

/// Test harness for spawning the API Gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let server = TestGatewayServer::spawn().await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestGatewayServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestGatewayServer {
    /// Spawn a server whose dependencies are all unreachable.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestGatewayOptions::default()).await
    }

    /// Spawn a server forwarding to the given dependency URLs.
    pub async fn spawn_with_dependencies(
        auth_service_url: &str,
        user_service_url: &str,
    ) -> Result<Self, anyhow::Error> {
        Self::spawn_with(TestGatewayOptions {
            auth_service_url: Some(auth_service_url.to_string()),
            user_service_url: Some(user_service_url.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Spawn a server with full control over dependencies and clock.
    ///
    /// The server binds 127.0.0.1:0 and runs in the background until dropped.
    pub async fn spawn_with(options: TestGatewayOptions) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "GATEWAY_JWT_SECRET".to_string(),
                TEST_SIGNING_KEY_B64.to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("GATEWAY_ID".to_string(), "gateway-test".to_string()),
            ("DOWNSTREAM_TIMEOUT_SECONDS".to_string(), "2".to_string()),
            (
                "AUTH_SERVICE_URL".to_string(),
                options
                    .auth_service_url
                    .unwrap_or_else(|| UNREACHABLE_URL.to_string()),
            ),
            (
                "USER_SERVICE_URL".to_string(),
                options
                    .user_service_url
                    .unwrap_or_else(|| UNREACHABLE_URL.to_string()),
            ),
        ]);
        vars.extend(options.extra_vars);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let client = HttpDownstreamClient::new(config.downstream_timeout())
            .map_err(|e| anyhow::anyhow!("Failed to build downstream client: {}", e))?;

        let clock: Arc<dyn Clock> = match options.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let state = Arc::new(AppState::with_clock(config, Arc::new(client), clock));

        // Build routes using the gateway's real route builder
        let app = routes::build_routes(state.clone(), metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Issue a token for `subject` with the server's codec and TTL.
    pub fn issue_token(&self, subject: &str) -> Result<String, anyhow::Error> {
        self.state
            .issue_token(subject)
            .map_err(|e| anyhow::anyhow!("Failed to issue token: {}", e))
    }
}

impl Drop for TestGatewayServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

/// A shared fixed clock for tests that move time.
pub fn fixed_clock(timestamp: i64) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(timestamp))
}
