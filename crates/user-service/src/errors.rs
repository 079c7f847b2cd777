//! User service error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Request did not come through the gateway (no subject header).
    #[error("Missing authenticated subject")]
    Unauthenticated,
}

impl UserServiceError {
    /// HTTP status code of the response this error renders as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
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
    message: String,
}

impl IntoResponse for UserServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = match &self {
            UserServiceError::Unauthenticated => "UNAUTHENTICATED",
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_unauthenticated_response() {
        let err = UserServiceError::Unauthenticated;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
        assert_eq!(body["error"]["message"], "Missing authenticated subject");
    }
}
