//! Authentication Module
//!
//! JWT sessions and the credential check shared by HTTP routes and the
//! realtime socket.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs        - Module exports and documentation
//! ├── sessions.rs   - JWT token creation and validation
//! └── handshake.rs  - Token extraction and user resolution
//! ```
//!
//! # Security
//!
//! - Tokens are HS256 JWTs signed with `JWT_SECRET`
//! - Tokens expire after `TOKEN_TTL_SECS` (30 days by default)
//! - A token whose user no longer exists is rejected
//!
//! Account registration and login live outside this service; it only
//! verifies tokens issued with the shared secret.

/// JWT token generation and validation
pub mod sessions;

/// Credential extraction and verification
pub mod handshake;

pub use handshake::{authenticate, extract_token, AuthError};
pub use sessions::{create_token, verify_token, Claims};
