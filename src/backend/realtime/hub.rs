use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::backend::realtime::registry::SocketId;
use crate::shared::ServerEvent;

/// Channel sender half for pushing events to a WebSocket connection.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Receiver half drained by a connection's sender task.
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

/// Events a connection may have queued before it counts as stalled.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Metadata for a single WebSocket connection.
struct HubConnection {
    user_id: Uuid,
    sender: EventSender,
}

/// Outbound queues of every live WebSocket connection.
///
/// Each connection owns one bounded FIFO queue drained by its sender task,
/// so events enqueued for a socket are written in the order they were sent.
/// A connection whose queue fills up is evicted: its queue closes, the sender
/// task ends and the socket is torn down, so a client never sees a gap in
/// the events it did receive. The map lock is synchronous and never held
/// across an await.
pub struct ConnectionHub {
    connections: RwLock<HashMap<SocketId, HubConnection>>,
    capacity: usize,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the queue so the caller can forward
    /// events to the WebSocket sink.
    pub fn add(&self, socket_id: SocketId, user_id: Uuid) -> EventReceiver {
        let (tx, rx) = mpsc::channel(self.capacity);
        let conn = HubConnection {
            user_id,
            sender: tx,
        };
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(socket_id, conn);
        rx
    }

    /// Remove a connection; its queue closes once the last sender drops.
    pub fn remove(&self, socket_id: SocketId) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&socket_id);
    }

    /// Queue an event for one connection.
    ///
    /// Returns `false` if the connection is gone, closed or was just evicted.
    pub fn send_to(&self, socket_id: SocketId, event: ServerEvent) -> bool {
        self.send_to_many(&[socket_id], &event) == 1
    }

    /// Queue an event for several connections.
    ///
    /// Closed queues are skipped silently and full ones are evicted. Returns
    /// how many accepted it.
    pub fn send_to_many(&self, socket_ids: &[SocketId], event: &ServerEvent) -> usize {
        let mut delivered = 0;
        let mut stalled = Vec::new();
        {
            let conns = self.connections.read().unwrap_or_else(PoisonError::into_inner);
            for id in socket_ids {
                let Some(conn) = conns.get(id) else { continue };
                match conn.sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => stalled.push(*id),
                    Err(TrySendError::Closed(_)) => {}
                }
            }
        }
        if !stalled.is_empty() {
            let mut conns = self.connections.write().unwrap_or_else(PoisonError::into_inner);
            for id in stalled {
                if conns.remove(&id).is_some() {
                    tracing::warn!(socket_id = %id, capacity = self.capacity, "[Realtime] Outbound queue full, disconnecting");
                }
            }
        }
        delivered
    }

    /// Connections belonging to a user.
    pub fn sockets_of_user(&self, user_id: Uuid) -> Vec<SocketId> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, conn)| conn.user_id == user_id)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Return the current number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every queue so each sender task ends and its socket closes.
    ///
    /// Used during graceful shutdown.
    pub fn disconnect_all(&self) {
        let mut conns = self.connections.write().unwrap_or_else(PoisonError::into_inner);
        let count = conns.len();
        conns.clear();
        tracing::info!(count, "[Realtime] Closed all WebSocket connections");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let hub = ConnectionHub::new();
        let socket = Uuid::new_v4();
        let _rx = hub.add(socket, Uuid::new_v4());
        assert_eq!(hub.connection_count(), 1);
        hub.remove(Uuid::new_v4());
        assert_eq!(hub.connection_count(), 1);
        hub.remove(socket);
        assert_eq!(hub.connection_count(), 0);
    }

    #[test]
    fn test_send_to_many_skips_closed_queues() {
        let hub = ConnectionHub::new();
        let open = Uuid::new_v4();
        let closed = Uuid::new_v4();
        let mut rx_open = hub.add(open, Uuid::new_v4());
        drop(hub.add(closed, Uuid::new_v4()));

        let delivered = hub.send_to_many(&[open, closed, Uuid::new_v4()], &ServerEvent::error("x"));
        assert_eq!(delivered, 1);
        assert_eq!(rx_open.try_recv().unwrap(), ServerEvent::error("x"));
    }

    #[test]
    fn test_queue_is_fifo() {
        let hub = ConnectionHub::new();
        let socket = Uuid::new_v4();
        let mut rx = hub.add(socket, Uuid::new_v4());
        for i in 0..5 {
            assert!(hub.send_to(socket, ServerEvent::error(i.to_string())));
        }
        for i in 0..5 {
            assert_eq!(rx.try_recv().unwrap(), ServerEvent::error(i.to_string()));
        }
    }

    #[test]
    fn test_full_queue_evicts_the_stalled_connection() {
        let hub = ConnectionHub::with_capacity(2);
        let slow = Uuid::new_v4();
        let fast = Uuid::new_v4();
        let mut rx_slow = hub.add(slow, Uuid::new_v4());
        let mut rx_fast = hub.add(fast, Uuid::new_v4());

        for i in 0..2 {
            assert_eq!(hub.send_to_many(&[slow, fast], &ServerEvent::error(i.to_string())), 2);
            assert_eq!(rx_fast.try_recv().unwrap(), ServerEvent::error(i.to_string()));
        }
        assert_eq!(hub.send_to_many(&[slow, fast], &ServerEvent::error("2")), 1);
        assert_eq!(hub.connection_count(), 1);
        assert!(!hub.send_to(slow, ServerEvent::error("3")));

        // What was queued before the eviction still drains in order, then closes
        assert_eq!(rx_slow.try_recv().unwrap(), ServerEvent::error("0"));
        assert_eq!(rx_slow.try_recv().unwrap(), ServerEvent::error("1"));
        assert!(rx_slow.try_recv().is_err());
        assert!(rx_slow.is_closed());
        assert_eq!(rx_fast.try_recv().unwrap(), ServerEvent::error("2"));
    }

    #[test]
    fn test_disconnect_all_closes_queues() {
        let hub = ConnectionHub::new();
        let user = Uuid::new_v4();
        let mut rx = hub.add(Uuid::new_v4(), user);
        let _other = hub.add(Uuid::new_v4(), user);
        assert_eq!(hub.sockets_of_user(user).len(), 2);
        hub.disconnect_all();
        assert_eq!(hub.connection_count(), 0);
        assert!(rx.try_recv().is_err());
        assert!(rx.is_closed());
    }
}
