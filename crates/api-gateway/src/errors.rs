//! API Gateway error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic. Credentials
//! are never echoed back.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::jwt::RejectionReason;
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header sent with every 401.
pub const WWW_AUTHENTICATE_VALUE: &str = r#"Bearer realm="storefront-api", error="invalid_token""#;

/// API Gateway error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - BadRequest: 400 Bad Request
/// - PayloadTooLarge: 413 Payload Too Large
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized: {0}")]
    Unauthorized(RejectionReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,
}

impl GatewayError {
    /// HTTP status code of the response this error renders as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    message: String,
}

fn rejection_message(reason: RejectionReason) -> &'static str {
    match reason {
        RejectionReason::Missing => "Authentication required",
        RejectionReason::Malformed => "Invalid or malformed token",
        RejectionReason::Expired => "Token has expired",
        RejectionReason::InvalidSignature => "Invalid token signature",
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, reason, message) = match &self {
            GatewayError::Unauthorized(reason) => (
                "INVALID_TOKEN",
                Some(reason.as_str()),
                rejection_message(*reason).to_string(),
            ),
            GatewayError::NotFound(resource) => ("NOT_FOUND", None, resource.clone()),
            GatewayError::BadRequest(reason) => ("BAD_REQUEST", None, reason.clone()),
            GatewayError::PayloadTooLarge => (
                "PAYLOAD_TOO_LARGE",
                None,
                "Request body exceeds the maximum allowed size".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                reason,
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::Unauthorized(RejectionReason::Missing).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::NotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_response_status_matches_status_code() {
        for err in [
            GatewayError::Unauthorized(RejectionReason::Expired),
            GatewayError::NotFound("x".to_string()),
            GatewayError::BadRequest("x".to_string()),
            GatewayError::PayloadTooLarge,
        ] {
            let expected = err.status_code();
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_display() {
        let err = GatewayError::Unauthorized(RejectionReason::InvalidSignature);
        assert_eq!(format!("{}", err), "Unauthorized: invalid-signature");

        let err = GatewayError::NotFound("No route".to_string());
        assert_eq!(format!("{}", err), "Not found: No route");
    }

    #[tokio::test]
    async fn test_unauthorized_response() {
        let response = GatewayError::Unauthorized(RejectionReason::Expired).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok());
        assert_eq!(
            www_auth,
            Some(r#"Bearer realm="storefront-api", error="invalid_token""#)
        );

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_TOKEN");
        assert_eq!(body["error"]["reason"], "expired");
        assert_eq!(body["error"]["message"], "Token has expired");
    }

    #[tokio::test]
    async fn test_unauthorized_reason_for_every_rejection() {
        for (reason, wire) in [
            (RejectionReason::Missing, "missing"),
            (RejectionReason::Malformed, "malformed"),
            (RejectionReason::Expired, "expired"),
            (RejectionReason::InvalidSignature, "invalid-signature"),
        ] {
            let body = body_json(GatewayError::Unauthorized(reason).into_response()).await;
            assert_eq!(body["error"]["reason"], wire);
        }
    }

    #[tokio::test]
    async fn test_not_found_response_has_no_reason() {
        let response = GatewayError::NotFound("No route for path".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "No route for path");
        assert!(body["error"].get("reason").is_none());
    }

    #[tokio::test]
    async fn test_payload_too_large_response() {
        let response = GatewayError::PayloadTooLarge.into_response();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }
}
