//! Authentication for the API Gateway.
//!
//! # Components
//!
//! - `gate` - Authentication gate: credential extraction and classification

pub mod gate;

pub use gate::{extract_credential, AuthGate, BEARER_PREFIX};
