//! Common utilities and types shared across Storefront services.

#![warn(clippy::pedantic)]

/// Module for clock abstraction and date formatting
pub mod clock;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for the signed identity token codec
pub mod jwt;

/// Module for tracing subscriber bootstrap
pub mod observability;
