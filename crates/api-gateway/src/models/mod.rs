//! API Gateway models.
//!
//! Response bodies for the gateway's own endpoints.

use serde::{Deserialize, Serialize};

/// Readiness probe response.
///
/// Returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// "ready" once the router is serving.
    pub status: String,

    /// Identifier of this gateway instance.
    pub gateway_id: String,

    /// Dependency names from the route table.
    pub dependencies: Vec<String>,
}

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    /// Verified subject.
    pub sub: String,

    /// Token expiration timestamp.
    pub exp: i64,

    /// Token issued-at timestamp, when the token carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// `exp` as `yyyy-MM-dd HH:mm:ss` (UTC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}
