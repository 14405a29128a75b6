//! Middleware Module
//!
//! Request processing middleware for the Axum router.

/// Authentication middleware and the `AuthUser` extractor
pub mod auth;

pub use auth::{auth_middleware, AuthUser};
