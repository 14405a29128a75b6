//! Backend Module
//!
//! All server-side code: the Axum HTTP server, the `/ws` realtime endpoint,
//! board mutations and persistence.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - configuration, application state, app creation
//! - **`routes`** - router assembly
//! - **`handlers`** - HTTP adapters over `mutations`
//! - **`mutations`** - authorized, validated board writes producing events
//! - **`access`** - board role resolution
//! - **`store`** - `BoardStore` trait with PostgreSQL and in-memory backends
//! - **`realtime`** - presence registry, connection hub, broadcaster, sockets
//! - **`auth`** - JWT sessions and the connection handshake
//! - **`middleware`** - request authentication
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs
//! ├── main.rs      - server binary
//! ├── access.rs
//! ├── server/
//! ├── routes/
//! ├── handlers/
//! ├── mutations/
//! ├── store/
//! ├── realtime/
//! ├── auth/
//! ├── middleware/
//! └── error/
//! ```
//!
//! # Flow of a Mutation
//!
//! ```text
//! HTTP request → auth_middleware → handler → mutation (access gate,
//! validation, store commit) → MutationOutcome::publish → room sockets
//! ```
//!
//! # Thread Safety
//!
//! The presence registry and connection hub are guarded by synchronous locks
//! that are never held across an `.await`; store calls are the only
//! suspension points inside a mutation.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// HTTP handlers
pub mod handlers;

/// Board writes
pub mod mutations;

/// Board role resolution
pub mod access;

/// Persistence
pub mod store;

/// Real-time board rooms
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication
pub mod auth;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use server::{create_app, AppState, ServerConfig};
