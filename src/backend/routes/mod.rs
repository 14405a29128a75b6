//! Routes Module
//!
//! Route configuration for the Axum server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs
//! ├── router.rs     - main router assembly, middleware, `/ws`, `/health`
//! └── api_routes.rs - authenticated REST routes under `/api`
//! ```

/// Main router configuration
pub mod router;

/// REST API routes
pub mod api_routes;

pub use router::create_router;
