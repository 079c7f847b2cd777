//! Fallback responder.
//!
//! Produces the degraded response returned when a downstream dependency
//! cannot be reached. The response depends only on the dependency name:
//! the same shape is used whether the call timed out, the connection was
//! refused, or the dependency answered 502/503/504.

use crate::config::Config;
use crate::services::{AUTH_SERVICE, USER_SERVICE};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

/// Default message when the auth service is unavailable.
pub const DEFAULT_AUTH_SERVICE_MESSAGE: &str =
    "Auth Service is currently unavailable. Please try again later.";

/// Default message when the user service is unavailable.
pub const DEFAULT_USER_SERVICE_MESSAGE: &str =
    "User Service is currently unavailable. Please try again later.";

/// Message for dependency names with no configured message.
pub const GENERIC_UNAVAILABLE_MESSAGE: &str =
    "Service is currently unavailable. Please try again later.";

/// Degraded response: always 503 with a plain text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackResponse {
    status: StatusCode,
    message: String,
}

impl FallbackResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for FallbackResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.message,
        )
            .into_response()
    }
}

/// Maps dependency names to their unavailability message.
///
/// Immutable after construction; `respond` is total and does no I/O.
#[derive(Debug, Clone)]
pub struct FallbackResponder {
    messages: HashMap<String, String>,
}

impl FallbackResponder {
    /// Create a responder from `(dependency, message)` pairs.
    pub fn new<I, K, V>(messages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            messages: messages
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Responder with the messages from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new([
            (AUTH_SERVICE, config.auth_service_fallback_message.as_str()),
            (USER_SERVICE, config.user_service_fallback_message.as_str()),
        ])
    }

    /// Build the degraded response for `dependency`.
    ///
    /// Unknown names get the generic message.
    pub fn respond(&self, dependency: &str) -> FallbackResponse {
        let message = self
            .messages
            .get(dependency)
            .map_or(GENERIC_UNAVAILABLE_MESSAGE, String::as_str);

        FallbackResponse {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.to_string(),
        }
    }

    /// Whether `dependency` has a configured message.
    pub fn knows(&self, dependency: &str) -> bool {
        self.messages.contains_key(dependency)
    }
}

impl Default for FallbackResponder {
    fn default() -> Self {
        Self::new([
            (AUTH_SERVICE, DEFAULT_AUTH_SERVICE_MESSAGE),
            (USER_SERVICE, DEFAULT_USER_SERVICE_MESSAGE),
        ])
    }
}
