//! Operational endpoint integration tests.
//!
//! `/health`, `/ready`, `/metrics` and `/fallback/{dependency}` are public.

use gateway_test_utils::TestGatewayServer;

/// Test that /health liveness endpoint returns 200 and plain text "OK".
#[tokio::test]
async fn test_health_endpoint_returns_200() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

/// Test that /ready returns JSON naming the instance and its dependencies.
#[tokio::test]
async fn test_ready_endpoint_returns_json() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert!(
        content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json")),
        "Expected application/json content type, got {:?}",
        content_type
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["gateway_id"], "gateway-test");
    assert_eq!(
        body["dependencies"],
        serde_json::json!(["auth-service", "user-service"])
    );

    Ok(())
}

/// Test that /metrics exposes the gateway request counter.
#[tokio::test]
async fn test_metrics_endpoint_exposes_request_counter() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn().await?;

    reqwest::get(format!("{}/health", server.url())).await?;
    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), 200);
    let body = response.text().await?;
    assert!(
        body.contains("gateway_http_requests_total"),
        "Expected request counter in metrics output"
    );

    Ok(())
}

/// Test that /fallback/{dependency} serves the configured message.
#[tokio::test]
async fn test_fallback_endpoint_known_dependencies() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn().await?;

    for (dependency, message) in [
        (
            "auth-service",
            "Auth Service is currently unavailable. Please try again later.",
        ),
        (
            "user-service",
            "User Service is currently unavailable. Please try again later.",
        ),
    ] {
        let response = reqwest::get(format!("{}/fallback/{}", server.url(), dependency)).await?;

        assert_eq!(response.status(), 503);
        assert_eq!(response.text().await?, message);
    }

    Ok(())
}

/// Test that unknown dependency names get the generic message.
#[tokio::test]
async fn test_fallback_endpoint_unknown_dependency() -> Result<(), anyhow::Error> {
    let server = TestGatewayServer::spawn().await?;

    let response = reqwest::get(format!("{}/fallback/inventory", server.url())).await?;

    assert_eq!(response.status(), 503);
    assert_eq!(
        response.text().await?,
        "Service is currently unavailable. Please try again later."
    );

    Ok(())
}
