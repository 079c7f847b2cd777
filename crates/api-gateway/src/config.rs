//! API Gateway configuration.
//!
//! Configuration is loaded from environment variables. The signing key is
//! decoded and validated at load time and is redacted in Debug output.

use crate::services::fallback::{DEFAULT_AUTH_SERVICE_MESSAGE, DEFAULT_USER_SERVICE_MESSAGE};
use common::jwt::{SigningKey, DEFAULT_TOKEN_TTL};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the base64 HS256 signing key.
pub const JWT_SECRET_ENV_VAR: &str = "GATEWAY_JWT_SECRET";

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default downstream request timeout in seconds.
pub const DEFAULT_DOWNSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the downstream request timeout in seconds.
pub const MAX_DOWNSTREAM_TIMEOUT_SECONDS: u64 = 300;

/// Default auth service base URL.
pub const DEFAULT_AUTH_SERVICE_URL: &str = "http://localhost:8083";

/// Default user service base URL.
pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:8081";

/// Default gateway instance ID prefix.
pub const DEFAULT_GATEWAY_ID_PREFIX: &str = "gateway";

/// API Gateway configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// HS256 signing key shared with token issuers.
    pub signing_key: Arc<SigningKey>,

    /// Lifetime of tokens issued by this gateway, in seconds (default: 86400).
    pub token_ttl_seconds: u64,

    /// Per-request timeout for downstream calls, in seconds (default: 10).
    pub downstream_timeout_seconds: u64,

    /// Base URL of the auth service.
    pub auth_service_url: String,

    /// Base URL of the user service.
    pub user_service_url: String,

    /// Message returned when the auth service is unavailable.
    pub auth_service_fallback_message: String,

    /// Message returned when the user service is unavailable.
    pub user_service_fallback_message: String,

    /// Unique identifier for this gateway instance.
    pub gateway_id: String,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("signing_key", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field(
                "downstream_timeout_seconds",
                &self.downstream_timeout_seconds,
            )
            .field("auth_service_url", &self.auth_service_url)
            .field("user_service_url", &self.user_service_url)
            .field(
                "auth_service_fallback_message",
                &self.auth_service_fallback_message,
            )
            .field(
                "user_service_fallback_message",
                &self.user_service_fallback_message,
            )
            .field("gateway_id", &self.gateway_id)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing key configuration: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid token TTL configuration: {0}")]
    InvalidTokenTtl(String),

    #[error("Invalid downstream timeout configuration: {0}")]
    InvalidDownstreamTimeout(String),

    #[error("Invalid fallback message configuration: {0}")]
    InvalidFallbackMessage(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let secret_b64 = vars
            .get(JWT_SECRET_ENV_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET_ENV_VAR.to_string()))?;

        let signing_key = SigningKey::from_base64(secret_b64).map_err(|e| {
            ConfigError::InvalidSigningKey(format!("{JWT_SECRET_ENV_VAR}: {e}"))
        })?;

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Parse token TTL with validation
        let token_ttl_seconds = if let Some(value_str) = vars.get("TOKEN_TTL_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenTtl(format!(
                    "TOKEN_TTL_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidTokenTtl(
                    "TOKEN_TTL_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_TOKEN_TTL.as_secs()
        };

        // Parse downstream timeout with validation
        let downstream_timeout_seconds =
            if let Some(value_str) = vars.get("DOWNSTREAM_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidDownstreamTimeout(format!(
                        "DOWNSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidDownstreamTimeout(
                        "DOWNSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                if value > MAX_DOWNSTREAM_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidDownstreamTimeout(format!(
                        "DOWNSTREAM_TIMEOUT_SECONDS must not exceed {} seconds, got {}",
                        MAX_DOWNSTREAM_TIMEOUT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_DOWNSTREAM_TIMEOUT_SECONDS
            };

        let auth_service_url = vars
            .get("AUTH_SERVICE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUTH_SERVICE_URL.to_string());

        let user_service_url = vars
            .get("USER_SERVICE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_SERVICE_URL.to_string());

        let auth_service_fallback_message = fallback_message(
            vars,
            "AUTH_SERVICE_FALLBACK_MESSAGE",
            DEFAULT_AUTH_SERVICE_MESSAGE,
        )?;

        let user_service_fallback_message = fallback_message(
            vars,
            "USER_SERVICE_FALLBACK_MESSAGE",
            DEFAULT_USER_SERVICE_MESSAGE,
        )?;

        // Generate gateway instance ID
        let gateway_id = vars.get("GATEWAY_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            // First 8 chars of a UUID for uniqueness
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{}-{}-{}", DEFAULT_GATEWAY_ID_PREFIX, hostname, short_suffix)
        });

        Ok(Config {
            bind_address,
            signing_key: Arc::new(signing_key),
            token_ttl_seconds,
            downstream_timeout_seconds,
            auth_service_url,
            user_service_url,
            auth_service_fallback_message,
            user_service_fallback_message,
            gateway_id,
        })
    }

    /// Token lifetime as a `Duration`.
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    /// Downstream timeout as a `Duration`.
    pub fn downstream_timeout(&self) -> Duration {
        Duration::from_secs(self.downstream_timeout_seconds)
    }
}

fn fallback_message(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidFallbackMessage(
            format!("{name} must not be empty"),
        )),
        Some(value) => Ok(value.clone()),
        None => Ok(default.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    // base64 of 32 bytes of 0x41 ('A')
    const TEST_SECRET_B64: &str = "QUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUE=";

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(JWT_SECRET_ENV_VAR.to_string(), TEST_SECRET_B64.to_string())])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = base_vars();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.token_ttl_seconds, 86_400);
        assert_eq!(config.downstream_timeout_seconds, 10);
        assert_eq!(config.auth_service_url, "http://localhost:8083");
        assert_eq!(config.user_service_url, "http://localhost:8081");
        assert_eq!(
            config.auth_service_fallback_message,
            "Auth Service is currently unavailable. Please try again later."
        );
        assert_eq!(
            config.user_service_fallback_message,
            "User Service is currently unavailable. Please try again later."
        );
        assert_eq!(config.signing_key.len(), 32);
        assert!(config.gateway_id.starts_with("gateway-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("TOKEN_TTL_SECONDS".to_string(), "3600".to_string());
        vars.insert("DOWNSTREAM_TIMEOUT_SECONDS".to_string(), "5".to_string());
        vars.insert(
            "AUTH_SERVICE_URL".to_string(),
            "http://auth.internal:8083".to_string(),
        );
        vars.insert(
            "USER_SERVICE_URL".to_string(),
            "http://users.internal:8081".to_string(),
        );
        vars.insert(
            "USER_SERVICE_FALLBACK_MESSAGE".to_string(),
            "Users are napping.".to_string(),
        );
        vars.insert("GATEWAY_ID".to_string(), "gateway-test-01".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.downstream_timeout(), Duration::from_secs(5));
        assert_eq!(config.auth_service_url, "http://auth.internal:8083");
        assert_eq!(config.user_service_url, "http://users.internal:8081");
        assert_eq!(config.user_service_fallback_message, "Users are napping.");
        assert_eq!(config.gateway_id, "gateway-test-01");
    }

    #[test]
    fn test_from_vars_missing_secret() {
        let vars = HashMap::new();

        let result = Config::from_vars(&vars);

        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref var)) if var == "GATEWAY_JWT_SECRET")
        );
    }

    #[test]
    fn test_from_vars_rejects_secret_that_is_not_base64() {
        let vars = HashMap::from([(
            JWT_SECRET_ENV_VAR.to_string(),
            "this is not base64!".to_string(),
        )]);

        let result = Config::from_vars(&vars);

        assert!(matches!(result, Err(ConfigError::InvalidSigningKey(_))));
    }

    #[test]
    fn test_from_vars_rejects_short_secret() {
        // base64 of "short-secret" (12 bytes)
        let vars = HashMap::from([(
            JWT_SECRET_ENV_VAR.to_string(),
            "c2hvcnQtc2VjcmV0".to_string(),
        )]);

        let result = Config::from_vars(&vars);

        match result {
            Err(ConfigError::InvalidSigningKey(msg)) => {
                assert!(msg.contains("at least 32 bytes"), "unexpected message: {msg}");
            }
            other => panic!("Expected InvalidSigningKey, got {other:?}"),
        }
    }

    #[test]
    fn test_token_ttl_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("TOKEN_TTL_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);

        assert!(matches!(result, Err(ConfigError::InvalidTokenTtl(_))));
    }

    #[test]
    fn test_token_ttl_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert("TOKEN_TTL_SECONDS".to_string(), "one-day".to_string());

        let result = Config::from_vars(&vars);

        match result {
            Err(ConfigError::InvalidTokenTtl(msg)) => {
                assert!(msg.contains("one-day"));
            }
            other => panic!("Expected InvalidTokenTtl, got {other:?}"),
        }
    }

    #[test]
    fn test_downstream_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("DOWNSTREAM_TIMEOUT_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDownstreamTimeout(_))
        ));
    }

    #[test]
    fn test_downstream_timeout_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("DOWNSTREAM_TIMEOUT_SECONDS".to_string(), "301".to_string());

        let result = Config::from_vars(&vars);

        match result {
            Err(ConfigError::InvalidDownstreamTimeout(msg)) => {
                assert!(msg.contains("must not exceed 300"));
            }
            other => panic!("Expected InvalidDownstreamTimeout, got {other:?}"),
        }
    }

    #[test]
    fn test_downstream_timeout_accepts_max() {
        let mut vars = base_vars();
        vars.insert("DOWNSTREAM_TIMEOUT_SECONDS".to_string(), "300".to_string());

        let config = Config::from_vars(&vars).expect("Config should load");

        assert_eq!(config.downstream_timeout_seconds, 300);
    }

    #[test]
    fn test_empty_fallback_message_rejected() {
        let mut vars = base_vars();
        vars.insert("AUTH_SERVICE_FALLBACK_MESSAGE".to_string(), "   ".to_string());

        let result = Config::from_vars(&vars);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidFallbackMessage(_))
        ));
    }

    #[test]
    fn test_debug_redacts_signing_key() {
        let config = Config::from_vars(&base_vars()).expect("Config should load");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(TEST_SECRET_B64));
        assert!(!debug_output.contains("AAAAAAAA"));
    }
}
