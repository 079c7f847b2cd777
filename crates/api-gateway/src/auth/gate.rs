//! Authentication gate.
//!
//! Every request that reaches a protected route or the route dispatcher is
//! evaluated exactly once:
//!
//! ```text
//! Start -> CredentialAbsent  -> Rejected(missing)
//!       -> CredentialPresent -> Verified | Rejected(reason)
//! ```
//!
//! The gate never retries and never panics. A missing credential is rejected
//! without touching the token verifier.

use crate::observability::metrics::record_auth_result;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use common::jwt::{AuthResult, Claims, RejectionReason, TokenVerifier};
use std::fmt;
use std::sync::Arc;

/// Authorization scheme prefix for bearer tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Classifies presented credentials using a [`TokenVerifier`].
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthGate {
    /// Create a gate backed by `verifier` (normally the shared `TokenCodec`).
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Evaluate a credential.
    ///
    /// `None` yields `Rejected { Missing }`; anything else is delegated to
    /// the verifier.
    pub fn authenticate(&self, credential: Option<&str>) -> AuthResult {
        match self.authenticate_claims(credential) {
            Ok(claims) => AuthResult::Authenticated { subject: claims.sub },
            Err(reason) => AuthResult::Rejected { reason },
        }
    }

    /// Evaluate a credential and keep the verified claims.
    ///
    /// Used by protected gateway routes that expose `exp`/`iat`.
    pub fn authenticate_claims(&self, credential: Option<&str>) -> Result<Claims, RejectionReason> {
        let result = match credential {
            None => {
                tracing::debug!(target: "gateway.auth.gate", "No credential presented");
                Err(RejectionReason::Missing)
            }
            Some(token) => self.verifier.verify_claims(token),
        };

        match &result {
            Ok(_) => {
                tracing::debug!(target: "gateway.auth.gate", "Credential verified");
                record_auth_result("authenticated");
            }
            Err(reason) => {
                tracing::debug!(target: "gateway.auth.gate", reason = %reason, "Credential rejected");
                record_auth_result(reason.as_str());
            }
        }

        result
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}

/// Pull the credential out of the `Authorization` header.
///
/// - no header: `None`
/// - `Bearer <token>`: `Some(token)`
/// - any other value: `Some(raw)`, which the verifier rejects as malformed
///
/// Non-UTF-8 header bytes are lossily converted; they can never form a
/// valid token.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?;

    let raw = match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!(target: "gateway.auth.gate", "Authorization header is not valid UTF-8");
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        }
    };

    match raw.strip_prefix(BEARER_PREFIX) {
        Some(token) => Some(token.trim().to_string()),
        None => {
            tracing::debug!(target: "gateway.auth.gate", "Authorization header is not a bearer credential");
            Some(raw)
        }
    }
}
