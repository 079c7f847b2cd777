//! Builder patterns for test tokens
//!
//! Produces tokens the gateway did not issue itself: other keys, other
//! algorithms, missing claims, tampered signatures.

use crate::keys::test_signing_key_bytes;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

/// Builder for test JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    exp: Option<i64>,
    iat: Option<i64>,
    key: Vec<u8>,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults: one hour, test key, HS256
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: Some("test-subject".to_string()),
            exp: Some((now + Duration::seconds(3600)).timestamp()),
            iat: Some(now.timestamp()),
            key: test_signing_key_bytes(),
            algorithm: Algorithm::HS256,
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Omit the `sub` claim
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Set an absolute expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = Some(timestamp);
        self
    }

    /// Omit the `exp` claim
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    /// Omit the `iat` claim
    pub fn without_issued_at(mut self) -> Self {
        self.iat = None;
        self
    }

    /// Sign with `key` instead of the test key
    pub fn signed_with(mut self, key: &[u8]) -> Self {
        self.key = key.to_vec();
        self
    }

    /// Sign with another HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Claims as a JSON value
    pub fn build_claims(&self) -> Value {
        let mut claims = json!({});
        if let Some(iat) = self.iat {
            claims["iat"] = json!(iat);
        }
        if let Some(sub) = &self.sub {
            claims["sub"] = json!(sub);
        }
        if let Some(exp) = self.exp {
            claims["exp"] = json!(exp);
        }
        claims
    }

    /// Signed compact token
    pub fn build(self) -> String {
        let claims = self.build_claims();
        encode(
            &Header::new(self.algorithm),
            &claims,
            &EncodingKey::from_secret(&self.key),
        )
        .expect("test token signing should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Token with `alg: none` and an empty signature.
pub fn unsigned_token(subject: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let exp = (Utc::now() + Duration::seconds(3600)).timestamp();
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": subject, "exp": exp }).to_string());
    format!("{header}.{payload}.")
}

/// Flip the lowest bit of the first signature byte.
pub fn tamper_signature(token: &str) -> String {
    let (signing_input, signature) = token
        .rsplit_once('.')
        .expect("token should have three segments");
    let mut bytes = URL_SAFE_NO_PAD
        .decode(signature)
        .expect("signature should be base64url");
    let first = bytes.first_mut().expect("signature should not be empty");
    *first ^= 0x01;
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// Replace the payload with one claiming `subject`, keeping the signature.
pub fn swap_subject(token: &str, subject: &str) -> String {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "token should have three segments");
    let mut payload: Value = serde_json::from_slice(
        &URL_SAFE_NO_PAD
            .decode(parts[1])
            .expect("payload should be base64url"),
    )
    .expect("payload should be JSON");
    payload["sub"] = json!(subject);
    format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(payload.to_string()),
        parts[2]
    )
}
