//! Signing key fixtures.

use base64::{engine::general_purpose::STANDARD, Engine};
use ring::rand::{SecureRandom, SystemRandom};

/// Base64 of 32 bytes of `'A'`; the key every test server is configured with.
pub const TEST_SIGNING_KEY_B64: &str = "QUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUE=";

/// Raw bytes of [`TEST_SIGNING_KEY_B64`].
pub fn test_signing_key_bytes() -> Vec<u8> {
    STANDARD
        .decode(TEST_SIGNING_KEY_B64)
        .expect("test key is valid base64")
}

/// Fresh random key bytes of `len` bytes.
pub fn random_signing_key_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .expect("system RNG should be available");
    bytes
}

/// Fresh random 32-byte key, base64 encoded.
pub fn random_signing_key_b64() -> String {
    STANDARD.encode(random_signing_key_bytes(32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_key_is_32_bytes() {
        assert_eq!(test_signing_key_bytes().len(), 32);
    }

    #[test]
    fn test_random_keys_differ() {
        let a = random_signing_key_b64();
        let b = random_signing_key_b64();
        assert_ne!(a, b);
        assert_eq!(STANDARD.decode(&a).unwrap().len(), 32);
    }
}
