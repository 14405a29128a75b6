//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the client and the server. Everything here is plain data plus pure logic,
//! so it compiles without the `ssr` or `client` features.
//!
//! # Overview
//!
//! - **`models`** - Boards, lists, cards, members and presence identities
//! - **`position`** - Dense integer position arithmetic
//! - **`event`** - Realtime wire events in both directions
//! - **`api`** - Request payloads and the tagged `ApiResponse` envelope
//! - **`error`** - Shared error types
//! - **`config`** - Client configuration

/// Board, list, card and member models
pub mod models;

/// Position arithmetic for ordered containers
pub mod position;

/// Realtime wire events
pub mod event;

/// HTTP request payloads and response envelope
pub mod api;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use models::{ActiveUser, Board, BoardDetails, BoardList, BoardMember, Card, Role, User};
pub use position::{PositionChange, PositionError, Positioned};
pub use event::{ClientMessage, ServerEvent};
pub use api::{ApiError, ApiResponse, ErrorKind, MovedCard};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
