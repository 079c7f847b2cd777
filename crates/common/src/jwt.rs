//! Signed identity token codec shared across Storefront services.
//!
//! Tokens are compact JWS (JWT) strings signed with HMAC-SHA256 using a
//! symmetric [`SigningKey`] loaded from configuration at startup. A token
//! asserts a subject (`sub`) and an expiry (`exp`); it is valid only when the
//! signature verifies AND the current time is strictly before `exp`.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HS256 is accepted; any other `alg` in the header is malformed
//! - Signatures are compared in constant time (HMAC re-sign, then
//!   `ring::constant_time::verify_slices_are_equal` inside `jsonwebtoken`)
//! - Expiry is checked only after the signature verifies
//! - Raw tokens and subjects are never logged
//!
//! # Usage
//!
//! ```rust
//! use common::jwt::{AuthResult, SigningKey, TokenCodec, TokenVerifier};
//! use std::time::Duration;
//!
//! let key = SigningKey::from_bytes(vec![7u8; 32]).unwrap();
//! let codec = TokenCodec::new(&key);
//!
//! let token = codec.issue("alice", Duration::from_secs(3600)).unwrap();
//! assert_eq!(codec.verify(&token), AuthResult::authenticated("alice"));
//! ```

use crate::clock::{Clock, SystemClock};
use crate::secret::{secret_bytes, ExposeSecret, SecretBytes};
use base64::{engine::general_purpose::STANDARD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed token size in bytes (8KB).
///
/// Anything larger is rejected as malformed before base64 decoding or any
/// cryptographic work. Typical tokens issued here are under 250 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Minimum signing key length in bytes (256 bits).
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Default token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while loading a key or issuing a token.
///
/// Verification never returns these; it reports failures as
/// [`AuthResult::Rejected`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Key material is not valid standard base64.
    #[error("Signing key is not valid base64")]
    InvalidKeyEncoding,

    /// Key material is shorter than [`MIN_SIGNING_KEY_BYTES`].
    #[error("Signing key too short: expected at least {min} bytes, got {actual}")]
    KeyTooShort {
        /// Required minimum length.
        min: usize,
        /// Length that was provided.
        actual: usize,
    },

    /// TTL is zero or overflows the expiry timestamp.
    #[error("Token TTL must be positive and representable")]
    InvalidTtl,

    /// Subject is empty.
    #[error("Token subject must not be empty")]
    EmptySubject,

    /// Signing failed inside the JWT library.
    #[error("Failed to encode token")]
    Encoding,
}

// =============================================================================
// Authentication outcome
// =============================================================================

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// No credential was presented.
    Missing,
    /// The credential could not be decoded as a token.
    Malformed,
    /// The token's `exp` has passed.
    Expired,
    /// The signature does not match the configured key.
    InvalidSignature,
}

impl RejectionReason {
    /// Wire name used in response bodies and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::Missing => "missing",
            RejectionReason::Malformed => "malformed",
            RejectionReason::Expired => "expired",
            RejectionReason::InvalidSignature => "invalid-signature",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a credential.
///
/// Produced per request and never persisted. The subject is redacted in
/// Debug output.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The token verified; `subject` is its identity claim.
    Authenticated {
        /// Identity asserted by the token.
        subject: String,
    },
    /// The credential was refused.
    Rejected {
        /// Reason class for the refusal.
        reason: RejectionReason,
    },
}

impl AuthResult {
    /// Shorthand for `AuthResult::Authenticated`.
    pub fn authenticated(subject: impl Into<String>) -> Self {
        AuthResult::Authenticated {
            subject: subject.into(),
        }
    }

    /// Shorthand for `AuthResult::Rejected`.
    #[must_use]
    pub fn rejected(reason: RejectionReason) -> Self {
        AuthResult::Rejected { reason }
    }

    /// Subject if authenticated.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthResult::Authenticated { subject } => Some(subject),
            AuthResult::Rejected { .. } => None,
        }
    }

    /// Rejection reason if rejected.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<RejectionReason> {
        match self {
            AuthResult::Authenticated { .. } => None,
            AuthResult::Rejected { reason } => Some(*reason),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthResult::Authenticated { .. })
    }
}

impl fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthResult::Authenticated { .. } => f
                .debug_struct("Authenticated")
                .field("subject", &"[REDACTED]")
                .finish(),
            AuthResult::Rejected { reason } => f
                .debug_struct("Rejected")
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Anything that can verify a presented token string.
///
/// Implemented by [`TokenCodec`]; the seam lets callers count or stub
/// verification in tests.
pub trait TokenVerifier: Send + Sync {
    /// Fully verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectionReason`] class on any failure. Must not panic.
    fn verify_claims(&self, token: &str) -> Result<Claims, RejectionReason>;

    /// Verify `token` and classify the outcome.
    fn verify(&self, token: &str) -> AuthResult {
        match self.verify_claims(token) {
            Ok(claims) => AuthResult::Authenticated {
                subject: claims.sub,
            },
            Err(reason) => AuthResult::Rejected { reason },
        }
    }
}

// =============================================================================
// Signing key
// =============================================================================

/// Symmetric key used to sign and verify tokens.
///
/// The bytes live in a zeroizing secret box and are readable only from this
/// module. Share it behind an `Arc` if several owners need it.
pub struct SigningKey(SecretBytes);

impl SigningKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyTooShort` if fewer than
    /// [`MIN_SIGNING_KEY_BYTES`] bytes are supplied.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TokenError> {
        if bytes.len() < MIN_SIGNING_KEY_BYTES {
            return Err(TokenError::KeyTooShort {
                min: MIN_SIGNING_KEY_BYTES,
                actual: bytes.len(),
            });
        }
        Ok(Self(secret_bytes(bytes)))
    }

    /// Build a key from standard (padded) base64 text.
    ///
    /// Surrounding whitespace is ignored so values copied from files with a
    /// trailing newline still load.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidKeyEncoding` if the text is not base64
    /// - `TokenError::KeyTooShort` if the decoded key is under 256 bits
    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Signing key base64 decode failed");
            TokenError::InvalidKeyEncoding
        })?;
        Self::from_bytes(bytes)
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Always false; a constructed key is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"[REDACTED]").finish()
    }
}

// =============================================================================
// Claims
// =============================================================================

/// Claims carried by a token.
///
/// Only `sub` and `exp` are required. Time claims accept any RFC 7519
/// `NumericDate`, fractional seconds included. The `sub` field is redacted
/// in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identity).
    pub sub: String,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(deserialize_with = "numeric_date")]
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds), if the issuer set one.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_numeric_date"
    )]
    pub iat: Option<i64>,
}

/// RFC 7519 `NumericDate`: integer or fractional seconds since the epoch.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Seconds(i64),
    Fractional(f64),
}

impl NumericDate {
    /// Whole seconds, rounded down so a fractional `exp` never extends
    /// validity. Non-finite values have no meaning.
    #[allow(clippy::cast_possible_truncation)]
    fn into_secs(self) -> Option<i64> {
        match self {
            NumericDate::Seconds(secs) => Some(secs),
            NumericDate::Fractional(secs) if secs.is_finite() => Some(secs.floor() as i64),
            NumericDate::Fractional(_) => None,
        }
    }
}

fn numeric_date<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumericDate::deserialize(deserializer)?
        .into_secs()
        .ok_or_else(|| de::Error::custom("NumericDate must be a finite number"))
}

fn optional_numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericDate>::deserialize(deserializer)?
        .map(|date| {
            date.into_secs()
                .ok_or_else(|| de::Error::custom("NumericDate must be a finite number"))
        })
        .transpose()
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Issues and verifies HS256 identity tokens.
///
/// Holds the only copy of the derived signing/verification keys. Immutable
/// after construction, so a single `Arc<TokenCodec>` can serve every request.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec that reads the wall clock.
    #[must_use]
    pub fn new(key: &SigningKey) -> Self {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    /// Create a codec that reads time from `clock`.
    #[must_use]
    pub fn with_clock(key: &SigningKey, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock in `verify_claims`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            encoding_key: EncodingKey::from_secret(key.expose()),
            decoding_key: DecodingKey::from_secret(key.expose()),
            validation,
            clock,
        }
    }

    /// Current time according to the codec's clock.
    #[must_use]
    pub fn now_secs(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Issue a token for `subject` that expires `ttl` from now.
    ///
    /// Deterministic for a fixed clock and key: no nonce is embedded.
    ///
    /// # Errors
    ///
    /// - `TokenError::EmptySubject` if `subject` is empty
    /// - `TokenError::InvalidTtl` if `ttl` is zero or overflows
    /// - `TokenError::Encoding` if signing fails
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        if ttl_secs == 0 {
            return Err(TokenError::InvalidTtl);
        }

        let iat = self.clock.now_secs();
        let exp = iat.checked_add(ttl_secs).ok_or(TokenError::InvalidTtl)?;

        let claims = Claims {
            sub: subject.to_string(),
            exp,
            iat: Some(iat),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(target: "common.jwt", error = %e, "Token signing failed");
            TokenError::Encoding
        })
    }
}

impl TokenVerifier for TokenCodec {
    fn verify_claims(&self, token: &str) -> Result<Claims, RejectionReason> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "common.jwt",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(RejectionReason::Malformed);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::InvalidSignature => RejectionReason::InvalidSignature,
                    ErrorKind::ExpiredSignature => RejectionReason::Expired,
                    _ => RejectionReason::Malformed,
                };
                tracing::debug!(target: "common.jwt", error = %e, reason = %reason, "Token rejected");
                reason
            })?;

        if claims.sub.is_empty() {
            tracing::debug!(target: "common.jwt", "Token rejected: empty subject");
            return Err(RejectionReason::Malformed);
        }

        let now = self.clock.now_secs();
        if now >= claims.exp {
            tracing::debug!(
                target: "common.jwt",
                exp = claims.exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(RejectionReason::Expired);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::cast_possible_wrap
)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const T0: i64 = 1_700_000_000;

    fn test_key(fill: u8) -> SigningKey {
        SigningKey::from_bytes(vec![fill; 32]).unwrap()
    }

    fn codec_at(clock: &Arc<FixedClock>) -> TokenCodec {
        TokenCodec::with_clock(&test_key(0x42), clock.clone())
    }

    fn split(token: &str) -> (String, String, String) {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "token should have three parts");
        (
            parts[0].to_string(),
            parts[1].to_string(),
            parts[2].to_string(),
        )
    }

    // -------------------------------------------------------------------------
    // Constants
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_ttl_is_24_hours() {
        assert_eq!(DEFAULT_TOKEN_TTL, Duration::from_secs(86_400));
    }

    #[test]
    fn test_min_key_is_256_bits() {
        assert_eq!(MIN_SIGNING_KEY_BYTES * 8, 256);
    }

    // -------------------------------------------------------------------------
    // SigningKey
    // -------------------------------------------------------------------------

    #[test]
    fn test_signing_key_rejects_short_key() {
        let result = SigningKey::from_bytes(vec![1u8; 31]);
        assert_eq!(
            result.unwrap_err(),
            TokenError::KeyTooShort {
                min: 32,
                actual: 31
            }
        );
    }

    #[test]
    fn test_signing_key_accepts_long_key() {
        let key = SigningKey::from_bytes(vec![1u8; 64]).unwrap();
        assert_eq!(key.len(), 64);
        assert!(!key.is_empty());
    }

    #[test]
    fn test_signing_key_from_base64() {
        let encoded = STANDARD.encode([9u8; 32]);
        let key = SigningKey::from_base64(&format!("{encoded}\n")).unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn test_signing_key_from_invalid_base64() {
        let result = SigningKey::from_base64("not-valid-base64!@#$");
        assert_eq!(result.unwrap_err(), TokenError::InvalidKeyEncoding);
    }

    #[test]
    fn test_signing_key_from_base64_too_short() {
        let encoded = STANDARD.encode([9u8; 16]);
        let result = SigningKey::from_base64(&encoded);
        assert!(matches!(
            result,
            Err(TokenError::KeyTooShort { actual: 16, .. })
        ));
    }

    #[test]
    fn test_signing_key_debug_is_redacted() {
        let key = SigningKey::from_bytes(b"super-secret-material-0123456789".to_vec()).unwrap();
        let debug_str = format!("{key:?}");
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret"));
    }

    // -------------------------------------------------------------------------
    // Issue / verify round trip
    // -------------------------------------------------------------------------

    #[test]
    fn test_verify_issued_token_before_expiry() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);

        for subject in ["alice", "bob@example.com", "user-8f14e45f", "ünïcødé"] {
            for ttl in [1u64, 60, 3600, 86_400] {
                let token = codec.issue(subject, Duration::from_secs(ttl)).unwrap();

                clock.set(T0 + ttl as i64 - 1);
                assert_eq!(
                    codec.verify(&token),
                    AuthResult::authenticated(subject),
                    "subject={subject} ttl={ttl}"
                );
                clock.set(T0);
            }
        }
    }

    #[test]
    fn test_issue_is_deterministic_for_fixed_clock() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);

        let first = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        let second = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_issued_claims_carry_iat_and_exp() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);

        let token = codec.issue("alice", Duration::from_secs(600)).unwrap();
        let claims = codec.verify_claims(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, Some(T0));
        assert_eq!(claims.exp, T0 + 600);
    }

    #[test]
    fn test_issue_rejects_empty_subject() {
        let codec = TokenCodec::new(&test_key(1));
        assert_eq!(
            codec.issue("", Duration::from_secs(60)).unwrap_err(),
            TokenError::EmptySubject
        );
    }

    #[test]
    fn test_issue_rejects_zero_ttl() {
        let codec = TokenCodec::new(&test_key(1));
        assert_eq!(
            codec.issue("alice", Duration::ZERO).unwrap_err(),
            TokenError::InvalidTtl
        );
    }

    #[test]
    fn test_issue_rejects_overflowing_ttl() {
        let codec = TokenCodec::new(&test_key(1));
        assert_eq!(
            codec.issue("alice", Duration::from_secs(u64::MAX)).unwrap_err(),
            TokenError::InvalidTtl
        );
    }

    // -------------------------------------------------------------------------
    // Expiry
    // -------------------------------------------------------------------------

    #[test]
    fn test_expired_at_exact_expiry_instant() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);
        let token = codec.issue("alice", Duration::from_secs(3600)).unwrap();

        clock.set(T0 + 3599);
        assert!(codec.verify(&token).is_authenticated());

        clock.set(T0 + 3600);
        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Expired)
        );
    }

    #[test]
    fn test_expired_for_any_time_past_expiry() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);
        let token = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();

        for past in [1u64, 60, 86_400, 10 * 365 * 86_400] {
            clock.set(T0);
            clock.advance(DEFAULT_TOKEN_TTL + Duration::from_secs(past));
            assert_eq!(
                codec.verify(&token),
                AuthResult::rejected(RejectionReason::Expired),
                "advanced {past}s past expiry"
            );
        }
    }

    // -------------------------------------------------------------------------
    // Signature tampering
    // -------------------------------------------------------------------------

    #[test]
    fn test_every_single_bit_flip_in_signature_is_rejected() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);
        let token = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        let (header, payload, signature) = split(&token);

        let sig_bytes = URL_SAFE_NO_PAD.decode(&signature).unwrap();
        assert_eq!(sig_bytes.len(), 32);

        for byte in 0..sig_bytes.len() {
            for bit in 0..8 {
                let mut tampered = sig_bytes.clone();
                tampered[byte] ^= 1 << bit;
                let forged = format!("{header}.{payload}.{}", URL_SAFE_NO_PAD.encode(&tampered));

                assert_eq!(
                    codec.verify(&forged),
                    AuthResult::rejected(RejectionReason::InvalidSignature),
                    "byte={byte} bit={bit}"
                );
            }
        }
    }

    #[test]
    fn test_tampered_payload_is_invalid_signature() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);
        let token = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        let (header, _payload, signature) = split(&token);

        let forged_claims = format!(r#"{{"sub":"mallory","exp":{},"iat":{T0}}}"#, T0 + 86_400);
        let forged = format!(
            "{header}.{}.{signature}",
            URL_SAFE_NO_PAD.encode(forged_claims)
        );

        assert_eq!(
            codec.verify(&forged),
            AuthResult::rejected(RejectionReason::InvalidSignature)
        );
    }

    #[test]
    fn test_token_from_other_key_is_invalid_signature() {
        let clock = Arc::new(FixedClock::new(T0));
        let issuer = TokenCodec::with_clock(&test_key(0x01), clock.clone());
        let verifier = TokenCodec::with_clock(&test_key(0x02), clock);

        let token = issuer.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        assert_eq!(
            verifier.verify(&token),
            AuthResult::rejected(RejectionReason::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_with_bad_signature_reports_signature() {
        let clock = Arc::new(FixedClock::new(T0));
        let issuer = TokenCodec::with_clock(&test_key(0x01), clock.clone());
        let verifier = TokenCodec::with_clock(&test_key(0x02), clock.clone());

        let token = issuer.issue("alice", Duration::from_secs(60)).unwrap();
        clock.advance(Duration::from_secs(3600));

        assert_eq!(
            verifier.verify(&token),
            AuthResult::rejected(RejectionReason::InvalidSignature)
        );
    }

    // -------------------------------------------------------------------------
    // Malformed input
    // -------------------------------------------------------------------------

    #[test]
    fn test_malformed_inputs() {
        let codec = TokenCodec::new(&test_key(1));

        for input in [
            "",
            "not-a-jwt",
            "only.two",
            "one.two.three.four",
            "!!!invalid!!!.payload.signature",
            ".payload.signature",
        ] {
            assert_eq!(
                codec.verify(input),
                AuthResult::rejected(RejectionReason::Malformed),
                "input={input:?}"
            );
        }
    }

    #[test]
    fn test_oversized_token_is_malformed() {
        let codec = TokenCodec::new(&test_key(1));
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(
            codec.verify(&oversized),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_alg_none_is_malformed() {
        let codec = TokenCodec::new(&test_key(1));
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice","exp":9999999999,"iat":0}"#);
        let token = format!("{header}.{payload}.");

        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_other_algorithm_is_malformed() {
        let key = test_key(1);
        let codec = TokenCodec::new(&key);
        let claims = Claims {
            sub: "alice".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: Some(chrono::Utc::now().timestamp()),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_missing_exp_is_malformed() {
        let key = test_key(1);
        let codec = TokenCodec::new(&key);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "alice", "iat": 0 }),
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_token_with_only_sub_and_exp_is_accepted() {
        let key = test_key(1);
        let clock = Arc::new(FixedClock::new(T0));
        let codec = TokenCodec::with_clock(&key, clock);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "alice", "exp": T0 + 3600 }),
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), AuthResult::authenticated("alice"));

        let claims = codec.verify_claims(&token).unwrap();
        assert_eq!(claims.exp, T0 + 3600);
        assert_eq!(claims.iat, None);
    }

    #[test]
    fn test_fractional_numeric_dates_are_accepted() {
        let key = test_key(1);
        let clock = Arc::new(FixedClock::new(T0));
        let codec = TokenCodec::with_clock(&key, clock.clone());
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({
                "sub": "alice",
                "exp": 1_700_003_600.75,
                "iat": 1_700_000_000.5
            }),
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        let claims = codec.verify_claims(&token).unwrap();
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(claims.iat, Some(1_700_000_000));

        // Rounded down: expired at the whole second
        clock.set(1_700_003_600);
        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Expired)
        );
    }

    #[test]
    fn test_non_numeric_exp_is_malformed() {
        let key = test_key(1);
        let codec = TokenCodec::new(&key);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "alice", "exp": "tomorrow" }),
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_absent_iat_is_not_serialized() {
        let claims = Claims {
            sub: "alice".to_string(),
            exp: 10,
            iat: None,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(!json.contains("iat"));
    }

    #[test]
    fn test_empty_subject_is_malformed() {
        let key = test_key(1);
        let codec = TokenCodec::new(&key);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "sub": "", "exp": 9_999_999_999_i64, "iat": 0 }),
            &EncodingKey::from_secret(key.expose()),
        )
        .unwrap();

        assert_eq!(
            codec.verify(&token),
            AuthResult::rejected(RejectionReason::Malformed)
        );
    }

    #[test]
    fn test_verify_is_idempotent() {
        let clock = Arc::new(FixedClock::new(T0));
        let codec = codec_at(&clock);
        let token = codec.issue("alice", DEFAULT_TOKEN_TTL).unwrap();
        let garbage = "garbage";

        assert_eq!(codec.verify(&token), codec.verify(&token));
        assert_eq!(codec.verify(garbage), codec.verify(garbage));
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    #[test]
    fn test_rejection_reason_wire_names() {
        assert_eq!(RejectionReason::Missing.as_str(), "missing");
        assert_eq!(RejectionReason::Malformed.as_str(), "malformed");
        assert_eq!(RejectionReason::Expired.as_str(), "expired");
        assert_eq!(
            RejectionReason::InvalidSignature.to_string(),
            "invalid-signature"
        );
    }

    #[test]
    fn test_auth_result_accessors() {
        let ok = AuthResult::authenticated("alice");
        assert_eq!(ok.subject(), Some("alice"));
        assert_eq!(ok.rejection_reason(), None);

        let rejected = AuthResult::rejected(RejectionReason::Expired);
        assert_eq!(rejected.subject(), None);
        assert_eq!(rejected.rejection_reason(), Some(RejectionReason::Expired));
        assert!(!rejected.is_authenticated());
    }

    #[test]
    fn test_auth_result_debug_redacts_subject() {
        let debug_str = format!("{:?}", AuthResult::authenticated("secret-user-id"));
        assert!(!debug_str.contains("secret-user-id"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = Claims {
            sub: "secret-user-id".to_string(),
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
        };

        let debug_str = format!("{claims:?}");
        assert!(!debug_str.contains("secret-user-id"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_codec_debug_hides_key() {
        let codec = TokenCodec::new(&test_key(0x61));
        let debug_str = format!("{codec:?}");
        assert!(debug_str.contains("HS256"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
