//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//! Mutation operations and HTTP handlers return `BackendError`, which converts
//! into an `ApiResponse::Error` body with a matching HTTP status.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and conversions from lower layers
//! ```
//!
//! # Error Categories
//!
//! - `Unauthorized` - Missing or invalid credentials
//! - `Forbidden` - Authenticated, but the role does not allow the operation
//! - `NotFound` - Entity missing or a stale id in a reorder request
//! - `SharedError` - Payload validation failures
//! - `Conflict` - Uniqueness violations such as a duplicate membership
//! - `Internal` - Storage or serialization failures
//!
//! Authorization, validation and not-found failures are recovered into
//! values here and are never broadcast.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
