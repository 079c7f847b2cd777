//! HTTP request handlers for the User Service.

pub mod health;
pub mod users;

pub use health::health_check;
pub use users::{users_me, users_test};
