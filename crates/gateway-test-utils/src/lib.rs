//! # Gateway Test Utilities
//!
//! Shared test utilities for the API Gateway.
//!
//! This crate provides:
//! - Signing key fixtures (`TEST_SIGNING_KEY_B64`, random keys)
//! - Token builders for hand-crafted and tampered tokens
//! - Server test harness (`TestGatewayServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gateway_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestGatewayServer::spawn().await?;
//!     let token = server.issue_token("alice")?;
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/auth/test", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod keys;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use keys::*;
pub use server_harness::*;
pub use token_builders::*;
