//! Taskboard - Main Library
//!
//! Taskboard is a multi-user kanban application (boards → lists → cards) with
//! live collaboration. Structural changes made by one client (card moves,
//! reorders, membership changes) show up on every other client looking at the
//! same board without a manual refresh.
//!
//! # Module Structure
//!
//! The library is organized into three main modules:
//!
//! - **`shared`** - Types shared between client and server
//!   - Board, list, card and member models
//!   - Position arithmetic for dense, gapless ordering
//!   - Realtime wire events and the `ApiResponse` envelope
//!   - Error and configuration types
//!
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!   - Axum HTTP server and WebSocket endpoint
//!   - Access gate, mutation operations and persistence
//!   - Presence registry, connection hub and room broadcaster
//!
//! - **`client`** - Client-side sync code (only compiled with the `client` feature)
//!   - Per-parent reconciliation cache with optimistic updates and rollback
//!   - HTTP mutation client and realtime WebSocket client
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server build (axum, sqlx, jsonwebtoken)
//! - **`client`** - Client build (reqwest, tokio-tungstenite)
//!
//! Both are enabled by default.
//!
//! # Data Flow
//!
//! ```text
//! client ──HTTP mutation──► Mutation Operation ──persist──► BoardStore
//!   ▲                              │
//!   │ optimistic apply             ▼ success
//!   │                         Broadcaster ──users in board room──► other clients
//!   └────── direct response ◄──────┘
//! ```
//!
//! The originating client updates its cache optimistically, again when its
//! own response arrives, and once more when the broadcast comes back. Every
//! reconciliation path is idempotent so the order of the last two does not
//! matter.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client-side cache, HTTP client and realtime client
#[cfg(feature = "client")]
pub mod client;
