//! Server Module
//!
//! Initializes and configures the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs
//! ├── state.rs   - AppState and FromRef implementations
//! ├── config.rs  - environment configuration, store selection
//! └── init.rs    - app creation
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::{create_app, create_app_with_store};
pub use state::AppState;
