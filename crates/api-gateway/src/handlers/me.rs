//! Current caller handler.

use crate::models::MeResponse;
use axum::{Extension, Json};
use common::clock::format_unix_timestamp;
use common::jwt::Claims;
use tracing::instrument;

/// Handler for GET /api/v1/me
///
/// Returns the verified claims of the caller's token. Requires `require_auth`.
///
/// ```json
/// { "sub": "alice", "exp": 1700086400, "iat": 1700000000, "expires_at": "2023-11-15 22:13:20" }
/// ```
#[instrument(skip_all, name = "gateway.handlers.me")]
pub async fn get_me(Extension(claims): Extension<Claims>) -> Json<MeResponse> {
    tracing::debug!(target: "gateway.handlers.me", "Returning caller claims");

    Json(MeResponse {
        expires_at: format_unix_timestamp(claims.exp),
        sub: claims.sub,
        exp: claims.exp,
        iat: claims.iat,
    })
}
