/**
 * Room Broadcasting
 *
 * `Broadcaster` delivers a `ServerEvent` to every connection in a board
 * room, originator included. Delivery is fire-and-forget: the mutation that
 * triggered it has already committed, so nothing here can fail the caller.
 *
 * The transport (`ConnectionHub`) is attached once at startup. Until then,
 * every call is dropped with a debug log, which lets mutation code run in
 * tests and tools without a socket server.
 */

use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::backend::realtime::hub::ConnectionHub;
use crate::backend::realtime::registry::{PresenceRegistry, SocketId};
use crate::shared::ServerEvent;

/// Cloneable handle for pushing events into board rooms
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<PresenceRegistry>,
    transport: Arc<OnceLock<Arc<ConnectionHub>>>,
}

impl Broadcaster {
    pub fn new(registry: Arc<PresenceRegistry>) -> Self {
        Self {
            registry,
            transport: Arc::new(OnceLock::new()),
        }
    }

    /// Attach the socket transport
    ///
    /// Returns `false` if one was already attached; the first one stays.
    pub fn attach_transport(&self, hub: Arc<ConnectionHub>) -> bool {
        self.transport.set(hub).is_ok()
    }

    pub fn has_transport(&self) -> bool {
        self.transport.get().is_some()
    }

    /// Deliver `event` to every connection in the board's room
    ///
    /// Returns how many connection queues accepted it.
    pub fn broadcast(&self, board_id: Uuid, event: ServerEvent) -> usize {
        let Some(hub) = self.transport.get() else {
            tracing::debug!(%board_id, event = event.name(), "[Realtime] No transport attached, event dropped");
            return 0;
        };
        let sockets = self.registry.sockets_in(board_id);
        let delivered = hub.send_to_many(&sockets, &event);
        tracing::debug!(
            %board_id,
            event = event.name(),
            delivered,
            "[Realtime] Event broadcast"
        );
        delivered
    }

    /// Send the board's full presence snapshot to its room
    pub fn emit_presence(&self, board_id: Uuid) -> usize {
        let users = self.registry.active_users(board_id);
        self.broadcast(board_id, ServerEvent::UsersActive { board_id, users })
    }

    /// Takes a user out of a board room after losing access to it
    ///
    /// The remaining members get a fresh presence snapshot.
    pub fn evict_user(&self, board_id: Uuid, user_id: Uuid) -> usize {
        let evicted = self.registry.remove_user(board_id, user_id);
        if !evicted.is_empty() {
            tracing::info!(%board_id, %user_id, sockets = evicted.len(), "[Realtime] Evicted from room");
            self.emit_presence(board_id);
        }
        evicted.len()
    }

    /// Empties the room of a deleted board
    pub fn close_room(&self, board_id: Uuid) -> usize {
        let closed = self.registry.close_room(board_id).len();
        if closed > 0 {
            tracing::info!(%board_id, sockets = closed, "[Realtime] Room closed");
        }
        closed
    }

    /// Send an `error` event to one connection only
    pub fn send_error(&self, socket_id: SocketId, message: impl Into<String>) -> bool {
        let message = message.into();
        let Some(hub) = self.transport.get() else {
            tracing::debug!(%socket_id, %message, "[Realtime] No transport attached, error dropped");
            return false;
        };
        tracing::debug!(%socket_id, %message, "[Realtime] Error event");
        hub.send_to(socket_id, ServerEvent::error(message))
    }
}
