//! Real-time Board Rooms
//!
//! Everything between a committed mutation and the sockets that should hear
//! about it.
//!
//! # Architecture
//!
//! - **`registry`** - which connection is in which board room (presence)
//! - **`hub`** - one outbound FIFO queue per live socket
//! - **`broadcast`** - fan an event out to a room through the hub
//! - **`lifecycle`** - per-socket state machine: join, leave, disconnect
//! - **`socket`** - the `/ws` endpoint: handshake, upgrade, read/write loops
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs
//! ├── registry.rs
//! ├── hub.rs
//! ├── broadcast.rs
//! ├── lifecycle.rs
//! └── socket.rs
//! ```
//!
//! # Delivery
//!
//! Delivery is at-most-once and fire-and-forget. Events for one room are
//! enqueued to every socket's queue before `broadcast` returns, so two
//! mutations on the same board reach every member in the same order. There
//! is no replay: a client that reconnects re-fetches the board.

pub mod broadcast;
pub mod hub;
pub mod lifecycle;
pub mod registry;
pub mod socket;

pub use broadcast::Broadcaster;
pub use hub::{ConnectionHub, EventReceiver, DEFAULT_QUEUE_CAPACITY};
pub use lifecycle::{Connection, ConnectionState};
pub use registry::{ConnectionIdentity, PresenceRegistry, SocketId};
pub use socket::ws_handler;
