//! Client Module
//!
//! Keeps a local copy of one board in sync with the server.
//!
//! - **`cache`** - Per-parent ordered collections with pending entries
//! - **`reconciliation`** - `BoardCache` and inbound event handling
//! - **`optimistic`** - Apply, confirm or roll back user mutations
//! - **`api`** - `BoardApi` trait and its `reqwest` implementation
//! - **`realtime`** - WebSocket connection and event pump

pub mod api;
pub mod cache;
pub mod optimistic;
pub mod realtime;
pub mod reconciliation;

pub use api::{BoardApi, ClientError, HttpBoardApi};
pub use cache::{CacheEntity, CacheEntry, CollectionCache, EntityKey, PendingToken, Snapshot};
pub use optimistic::OptimisticBoard;
pub use realtime::{pump_events, RealtimeClient};
pub use reconciliation::{BoardCache, ReconciliationResult};
