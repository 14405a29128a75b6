//! Connection Lifecycle
//!
//! One `Connection` per authenticated socket. It is created after the
//! handshake succeeded (so it always has an identity) and tracks which board
//! room, if any, the socket is in:
//!
//! ```text
//! authenticated(room: none) ⇄ authenticated(room: board) → disconnected
//! ```
//!
//! A connection is in at most one room; joining another board leaves the
//! current one first. Every join re-checks access, so a member removed from a
//! board cannot rejoin its room even on a socket that was opened earlier.
//!
//! Errors never close the socket. They are reported back to this socket only
//! as an `error` event.

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::access::resolve_access;
use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::Broadcaster;
use crate::backend::realtime::registry::{ConnectionIdentity, PresenceRegistry, SocketId};
use crate::backend::store::BoardStore;
use crate::shared::{ClientMessage, SharedError};

/// Where a connection stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Authenticated { room: Option<Uuid> },
    Disconnected,
}

/// Server side of one realtime socket
pub struct Connection {
    identity: ConnectionIdentity,
    state: ConnectionState,
    store: Arc<dyn BoardStore>,
    registry: Arc<PresenceRegistry>,
    broadcaster: Broadcaster,
}

impl Connection {
    pub fn new(
        identity: ConnectionIdentity,
        store: Arc<dyn BoardStore>,
        registry: Arc<PresenceRegistry>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            identity,
            state: ConnectionState::Authenticated { room: None },
            store,
            registry,
            broadcaster,
        }
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn socket_id(&self) -> SocketId {
        self.identity.socket_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn current_room(&self) -> Option<Uuid> {
        match self.state {
            ConnectionState::Authenticated { room } => room,
            ConnectionState::Disconnected => None,
        }
    }

    /// Handles one inbound text frame
    pub async fn handle_text(&mut self, text: &str) {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(socket_id = %self.socket_id(), error = %err, "[Realtime] Rejected frame");
                self.report(frame_error_message(&err));
                return;
            }
        };

        match message {
            ClientMessage::JoinBoard { board_id } => {
                if let Err(err) = self.join_board(board_id).await {
                    self.report(err.message());
                }
            }
            ClientMessage::LeaveBoard { board_id } => {
                self.leave_board(board_id);
            }
        }
    }

    /// Joins a board room after checking access
    ///
    /// On denial nothing changes: the connection stays in its current room.
    pub async fn join_board(&mut self, board_id: Uuid) -> Result<(), BackendError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        let access = resolve_access(self.store.as_ref(), board_id, self.identity.user_id, false).await?;
        if !access.has_access {
            tracing::info!(
                %board_id,
                user_id = %self.identity.user_id,
                "[Realtime] Join denied"
            );
            return Err(BackendError::forbidden("Access denied to this board"));
        }

        if let Some(previous) = self.current_room().filter(|room| *room != board_id) {
            if self.registry.leave(previous, self.socket_id()) {
                self.broadcaster.emit_presence(previous);
            }
        }

        self.registry.join(board_id, self.identity.clone());
        self.state = ConnectionState::Authenticated { room: Some(board_id) };
        tracing::info!(
            %board_id,
            user_id = %self.identity.user_id,
            socket_id = %self.socket_id(),
            "[Realtime] Joined board"
        );
        self.broadcaster.emit_presence(board_id);
        Ok(())
    }

    /// Leaves a board room
    ///
    /// Returns whether the connection was in it.
    pub fn leave_board(&mut self, board_id: Uuid) -> bool {
        let removed = self.registry.leave(board_id, self.socket_id());
        if self.current_room() == Some(board_id) {
            self.state = ConnectionState::Authenticated { room: None };
        }
        if removed {
            tracing::info!(%board_id, socket_id = %self.socket_id(), "[Realtime] Left board");
            self.broadcaster.emit_presence(board_id);
        }
        removed
    }

    /// Drops the connection from every room and re-announces presence there
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn disconnect(&mut self) -> Vec<Uuid> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }
        self.state = ConnectionState::Disconnected;

        let affected = self.registry.remove_connection_everywhere(self.socket_id());
        for board_id in &affected {
            self.broadcaster.emit_presence(*board_id);
        }
        tracing::info!(
            socket_id = %self.socket_id(),
            user_id = %self.identity.user_id,
            rooms = affected.len(),
            "[Realtime] Connection closed"
        );
        affected
    }

    fn report(&self, message: String) {
        self.broadcaster.send_error(self.socket_id(), message);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn frame_error_message(err: &SharedError) -> String {
    match err {
        SharedError::ValidationError { message, .. } => message.clone(),
        SharedError::UnknownEvent(name) => format!("Unknown event: {}", name),
        SharedError::SerializationError { .. } => "Malformed message".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::hub::{ConnectionHub, EventReceiver};
    use crate::backend::store::MemoryStore;
    use crate::shared::{Role, ServerEvent, User};

    struct Fixture {
        store: Arc<MemoryStore>,
        registry: Arc<PresenceRegistry>,
        hub: Arc<ConnectionHub>,
        broadcaster: Broadcaster,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(PresenceRegistry::new());
            let hub = Arc::new(ConnectionHub::new());
            let broadcaster = Broadcaster::new(registry.clone());
            broadcaster.attach_transport(hub.clone());
            Self {
                store: Arc::new(MemoryStore::new()),
                registry,
                hub,
                broadcaster,
            }
        }

        async fn user(&self, name: &str) -> User {
            self.store
                .upsert_user(User {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    avatar_url: None,
                })
                .await
                .unwrap()
        }

        fn connect(&self, user: &User) -> (Connection, EventReceiver) {
            let socket_id = Uuid::new_v4();
            let rx = self.hub.add(socket_id, user.id);
            let connection = Connection::new(
                ConnectionIdentity::new(socket_id, user),
                self.store.clone(),
                self.registry.clone(),
                self.broadcaster.clone(),
            );
            (connection, rx)
        }
    }

    fn drain(rx: &mut EventReceiver) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_join_emits_presence() {
        let fx = Fixture::new();
        let alice = fx.user("Alice").await;
        let board = fx.store.create_board(&alice, "B".into(), "#fff".into()).await.unwrap();
        let (mut conn, mut rx) = fx.connect(&alice);

        conn.handle_text(&format!(r#"{{"event":"join-board","data":{{"boardId":"{}"}}}}"#, board.id))
            .await;

        assert_eq!(conn.current_room(), Some(board.id));
        match drain(&mut rx).as_slice() {
            [ServerEvent::UsersActive { board_id, users }] => {
                assert_eq!(*board_id, board.id);
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].id, alice.id);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_member_join_is_denied() {
        let fx = Fixture::new();
        let owner = fx.user("Owner").await;
        let mallory = fx.user("Mallory").await;
        let board = fx.store.create_board(&owner, "B".into(), "#fff".into()).await.unwrap();
        let (mut conn, mut rx) = fx.connect(&mallory);

        assert!(conn.join_board(board.id).await.is_err());
        conn.handle_text(&format!(r#"{{"event":"join-board","data":{{"boardId":"{}"}}}}"#, board.id))
            .await;

        assert_eq!(conn.current_room(), None);
        assert!(fx.registry.sockets_in(board.id).is_empty());
        assert_eq!(drain(&mut rx), vec![ServerEvent::error("Access denied to this board")]);
    }

    #[tokio::test]
    async fn test_switching_boards_leaves_previous_room() {
        let fx = Fixture::new();
        let alice = fx.user("Alice").await;
        let bob = fx.user("Bob").await;
        let first = fx.store.create_board(&alice, "One".into(), "#fff".into()).await.unwrap();
        let second = fx.store.create_board(&alice, "Two".into(), "#fff".into()).await.unwrap();
        fx.store.add_member(first.id, &bob, Role::Viewer).await.unwrap();

        let (mut bob_conn, mut bob_rx) = fx.connect(&bob);
        bob_conn.join_board(first.id).await.unwrap();
        let (mut alice_conn, _alice_rx) = fx.connect(&alice);
        alice_conn.join_board(first.id).await.unwrap();
        drain(&mut bob_rx);

        alice_conn.join_board(second.id).await.unwrap();
        assert_eq!(fx.registry.rooms_of(alice_conn.socket_id()), vec![second.id]);
        match drain(&mut bob_rx).as_slice() {
            [ServerEvent::UsersActive { users, .. }] => {
                assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id]);
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_frames_report_errors_without_state_change() {
        let fx = Fixture::new();
        let alice = fx.user("Alice").await;
        let (mut conn, mut rx) = fx.connect(&alice);

        conn.handle_text(r#"{"event":"join-board","data":{}}"#).await;
        conn.handle_text(r#"{"event":"dance","data":{}}"#).await;
        conn.handle_text("not json").await;

        assert_eq!(conn.current_room(), None);
        assert_eq!(
            drain(&mut rx),
            vec![
                ServerEvent::error("a valid boardId is required"),
                ServerEvent::error("Unknown event: dance"),
                ServerEvent::error("Malformed message"),
            ]
        );
    }

    #[tokio::test]
    async fn test_drop_cleans_up_presence() {
        let fx = Fixture::new();
        let alice = fx.user("Alice").await;
        let bob = fx.user("Bob").await;
        let board = fx.store.create_board(&alice, "B".into(), "#fff".into()).await.unwrap();
        fx.store.add_member(board.id, &bob, Role::Editor).await.unwrap();

        let (mut alice_conn, mut alice_rx) = fx.connect(&alice);
        alice_conn.join_board(board.id).await.unwrap();
        let (mut bob_conn, _bob_rx) = fx.connect(&bob);
        bob_conn.join_board(board.id).await.unwrap();
        drain(&mut alice_rx);

        drop(bob_conn);

        assert_eq!(fx.registry.sockets_in(board.id), vec![alice_conn.socket_id()]);
        match drain(&mut alice_rx).as_slice() {
            [ServerEvent::UsersActive { users, .. }] => assert_eq!(users.len(), 1),
            other => panic!("unexpected events: {:?}", other),
        }
        assert_eq!(alice_conn.disconnect(), vec![board.id]);
        assert!(alice_conn.disconnect().is_empty());
        assert_eq!(fx.registry.room_count(), 0);
    }
}
