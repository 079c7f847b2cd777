//! User endpoints.

use crate::errors::UserServiceError;
use axum::{http::HeaderMap, Json};
use serde::Serialize;
use tracing::instrument;

/// Header set by the gateway after verifying the caller's token.
pub const SUBJECT_HEADER: &str = "x-authenticated-subject";

/// Response for `/api/users/me`.
#[derive(Debug, Clone, Serialize)]
pub struct UserMeResponse {
    pub subject: String,
}

/// Handler for GET /api/users/test
pub async fn users_test() -> &'static str {
    "✅ User Service is reachable"
}

/// Handler for GET /api/users/me
///
/// Echoes the subject the gateway propagated.
#[instrument(skip_all, name = "user_service.handlers.me")]
pub async fn users_me(headers: HeaderMap) -> Result<Json<UserMeResponse>, UserServiceError> {
    let subject = headers
        .get(SUBJECT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "user_service.handlers.users", "Request without subject header");
            UserServiceError::Unauthenticated
        })?;

    Ok(Json(UserMeResponse {
        subject: subject.to_string(),
    }))
}
