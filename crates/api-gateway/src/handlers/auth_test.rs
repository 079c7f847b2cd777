//! Protected probe for checking a token end to end.

use tracing::instrument;

/// Handler for GET /auth/test
///
/// Only reached when `require_auth` accepted the token.
#[instrument(skip_all, name = "gateway.handlers.auth_test")]
pub async fn auth_test() -> &'static str {
    "JWT validation successful!"
}
