//! Secret types for protecting sensitive values from accidental logging.
//!
//! Thin re-export of the [`secrecy`] crate. Use these wrappers for anything
//! that must never show up in logs: signing keys, bearer tokens, base64 key
//! material read from the environment.
//!
//! `SecretBox<T>` and `SecretString` implement `Debug` with redaction, so a
//! struct that derives `Debug` over a secret field prints `[REDACTED]`
//! instead of the value. Secrets are zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct GatewaySecrets {
//!     jwt_secret_b64: SecretString,
//! }
//!
//! let secrets = GatewaySecrets {
//!     jwt_secret_b64: SecretString::from("c2VjcmV0"),
//! };
//!
//! assert!(!format!("{secrets:?}").contains("c2VjcmV0"));
//! assert_eq!(secrets.jwt_secret_b64.expose_secret(), "c2VjcmV0");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// Owned binary secret (raw key bytes), zeroized on drop.
pub type SecretBytes = SecretBox<Vec<u8>>;

/// Wrap raw bytes in a [`SecretBytes`].
#[must_use]
pub fn secret_bytes(bytes: Vec<u8>) -> SecretBytes {
    SecretBox::new(Box::new(bytes))
}
