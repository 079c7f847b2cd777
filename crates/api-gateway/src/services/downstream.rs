//! Downstream HTTP client.
//!
//! Forwards an already-authenticated request to a dependency and classifies
//! failures. Connection errors, timeouts and 502/503/504 answers all mean
//! the dependency is unavailable; every other response is passed back as-is.
//!
//! # Security
//!
//! - Timeouts prevent hanging connections
//! - Hop-by-hop headers are never forwarded in either direction
//! - Errors are logged server-side; callers see only the classification

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName, Method, StatusCode};
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, instrument, warn};

/// Default connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Whether `name` describes a single transport hop and must not be forwarded.
///
/// `content-length` and `host` are included; both are recomputed per hop.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "content-length"
            | "host"
    )
}

/// Header names listed in `Connection`, which are hop-by-hop for this
/// message only (RFC 9110 section 7.6.1). Unparseable tokens are skipped.
fn connection_options(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| HeaderName::from_bytes(token.as_bytes()).ok())
        .collect()
}

/// Copy `headers` without hop-by-hop entries, including any header named
/// by `Connection`.
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let options = connection_options(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) && !options.contains(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Request to send to a dependency.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path and query, starting with `/`.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Response received from a dependency.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Errors when forwarding.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// The dependency could not serve the request.
    #[error("Downstream unavailable: {0}")]
    Unavailable(String),

    /// The request could not be built (bad base URL, bad method).
    #[error("Invalid downstream request: {0}")]
    InvalidRequest(String),
}

/// Trait for forwarding requests to dependencies.
///
/// Allows mocking the downstream side in tests.
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    /// Send `request` to the service rooted at `base_url`.
    async fn forward(
        &self,
        base_url: &str,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, DownstreamError>;
}

/// `reqwest`-backed downstream client with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpDownstreamClient {
    client: Client,
}

impl HttpDownstreamClient {
    /// Create a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DownstreamError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, DownstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            // Redirects are returned to the caller unchanged
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                error!(target: "gateway.services.downstream", error = %e, "Failed to build HTTP client");
                DownstreamError::InvalidRequest("Failed to build HTTP client".to_string())
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DownstreamClient for HttpDownstreamClient {
    #[instrument(skip_all, name = "gateway.services.downstream.forward", fields(method = %request.method))]
    async fn forward(
        &self,
        base_url: &str,
        request: ForwardRequest,
    ) -> Result<ForwardResponse, DownstreamError> {
        let url = format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            request.path_and_query
        );

        let response = self
            .client
            .request(request.method, &url)
            .headers(strip_hop_by_hop(&request.headers))
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    error!(target: "gateway.services.downstream", error = %e, "Invalid downstream URL");
                    DownstreamError::InvalidRequest("Invalid downstream URL".to_string())
                } else {
                    warn!(target: "gateway.services.downstream", error = %e, timeout = e.is_timeout(), "Downstream request failed");
                    DownstreamError::Unavailable(if e.is_timeout() {
                        "timeout".to_string()
                    } else {
                        "connection failed".to_string()
                    })
                }
            })?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            warn!(target: "gateway.services.downstream", status = %status, "Downstream reported unavailable");
            return Err(DownstreamError::Unavailable(format!("status {status}")));
        }

        let headers = strip_hop_by_hop(response.headers());
        let body = response.bytes().await.map_err(|e| {
            warn!(target: "gateway.services.downstream", error = %e, "Failed to read downstream body");
            DownstreamError::Unavailable("body read failed".to_string())
        })?;

        Ok(ForwardResponse {
            status,
            headers,
            body,
        })
    }
}

/// Mock downstream client module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock downstream client.
    ///
    /// Records every forwarded request and answers with a canned response.
    pub struct MockDownstream {
        response: Option<ForwardResponse>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<(String, ForwardRequest)>>,
    }

    impl MockDownstream {
        /// Create a mock that answers every request with `status` and `body`.
        pub fn responding(status: StatusCode, body: impl Into<Bytes>) -> Self {
            Self {
                response: Some(ForwardResponse {
                    status,
                    headers: HeaderMap::new(),
                    body: body.into(),
                }),
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock whose dependency is always unavailable.
        pub fn unavailable() -> Self {
            Self {
                response: None,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Number of forward calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// `(base_url, request)` pairs in call order.
        pub fn requests(&self) -> Vec<(String, ForwardRequest)> {
            self.requests
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl DownstreamClient for MockDownstream {
        async fn forward(
            &self,
            base_url: &str,
            request: ForwardRequest,
        ) -> Result<ForwardResponse, DownstreamError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut guard) = self.requests.lock() {
                guard.push((base_url.to_string(), request));
            }

            self.response
                .clone()
                .ok_or_else(|| DownstreamError::Unavailable("mock unavailable".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use wiremock::matchers::{header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn get(path_and_query: &str) -> ForwardRequest {
        ForwardRequest {
            method: Method::GET,
            path_and_query: path_and_query.to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn client() -> HttpDownstreamClient {
        HttpDownstreamClient::new(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::HOST, HeaderValue::from_static("gateway.local"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("12"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));

        let stripped = strip_hop_by_hop(&headers);

        assert!(stripped.get(header::CONNECTION).is_none());
        assert!(stripped.get("keep-alive").is_none());
        assert!(stripped.get(header::TRANSFER_ENCODING).is_none());
        assert!(stripped.get(header::HOST).is_none());
        assert!(stripped.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(stripped.get(header::ACCEPT).unwrap(), "application/json");
        assert_eq!(stripped.get_all("x-trace").iter().count(), 2);
    }

    #[test]
    fn test_strip_removes_headers_named_by_connection() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONNECTION,
            HeaderValue::from_static("keep-alive, X-Hop-Debug"),
        );
        headers.append(header::CONNECTION, HeaderValue::from_static(" x-hop-route ,"));
        headers.insert("x-hop-debug", HeaderValue::from_static("1"));
        headers.insert("x-hop-route", HeaderValue::from_static("edge-7"));
        headers.insert("x-request-id", HeaderValue::from_static("req-1"));

        let stripped = strip_hop_by_hop(&headers);

        assert!(stripped.get(header::CONNECTION).is_none());
        assert!(stripped.get("x-hop-debug").is_none());
        assert!(stripped.get("x-hop-route").is_none());
        assert_eq!(stripped.get("x-request-id").unwrap(), "req-1");
    }

    #[tokio::test]
    async fn test_forward_drops_connection_named_response_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("connection", "x-upstream-hop")
                    .insert_header("x-upstream-hop", "1")
                    .insert_header("x-upstream-kept", "1"),
            )
            .mount(&server)
            .await;

        let response = client().forward(&server.uri(), get("/hop")).await.unwrap();

        assert!(response.headers.get("x-upstream-hop").is_none());
        assert_eq!(response.headers.get("x-upstream-kept").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_forward_passes_through_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/42"))
            .and(query_param("expand", "true"))
            .and(header_matcher("x-authenticated-subject", "alice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-user-version", "7")
                    .set_body_string("{\"id\":42}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut request = get("/api/users/42?expand=true");
        request.headers.insert(
            "x-authenticated-subject",
            HeaderValue::from_static("alice"),
        );

        let response = client().forward(&server.uri(), request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get("x-user-version").unwrap(), "7");
        assert_eq!(response.body, Bytes::from_static(b"{\"id\":42}"));
    }

    #[tokio::test]
    async fn test_forward_passes_through_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad input"))
            .mount(&server)
            .await;

        let request = ForwardRequest {
            method: Method::POST,
            path_and_query: "/api/users".to_string(),
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{}"),
        };

        let response = client().forward(&server.uri(), request).await.unwrap();

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body, Bytes::from_static(b"bad input"));
    }

    #[tokio::test]
    async fn test_forward_passes_through_internal_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let response = client().forward(&server.uri(), get("/boom")).await.unwrap();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_gateway_statuses_are_unavailable() {
        for status in [502u16, 503, 504] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let result = client().forward(&server.uri(), get("/x")).await;

            assert!(
                matches!(result, Err(DownstreamError::Unavailable(_))),
                "status {status} should be unavailable"
            );
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = client().forward(&format!("http://{addr}"), get("/x")).await;

        assert!(matches!(result, Err(DownstreamError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = HttpDownstreamClient::new(Duration::from_millis(200)).unwrap();
        let result = client.forward(&server.uri(), get("/slow")).await;

        match result {
            Err(DownstreamError::Unavailable(reason)) => assert_eq!(reason, "timeout"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_invalid_request() {
        let result = client().forward("not a url", get("/x")).await;

        assert!(matches!(result, Err(DownstreamError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let mock = mock::MockDownstream::responding(StatusCode::OK, "hi");

        let response = mock.forward("http://users", get("/a")).await.unwrap();

        assert_eq!(response.body, Bytes::from_static(b"hi"));
        assert_eq!(mock.call_count(), 1);
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests.first().map(|(u, _)| u.as_str()), Some("http://users"));
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let mock = mock::MockDownstream::unavailable();

        let result = mock.forward("http://users", get("/a")).await;

        assert!(matches!(result, Err(DownstreamError::Unavailable(_))));
        assert_eq!(mock.call_count(), 1);
    }
}
