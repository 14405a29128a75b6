//! Common test utilities and helpers
//!
//! Builds an in-memory board with its owner, an editor and a viewer, and
//! wires a realtime core around it so tests can watch what each socket
//! receives.

#![allow(dead_code)]

use std::sync::Arc;

use taskboard::backend::realtime::{
    Broadcaster, Connection, ConnectionHub, ConnectionIdentity, EventReceiver, PresenceRegistry,
};
use taskboard::backend::store::{BoardStore, MemoryStore};
use taskboard::backend::ServerConfig;
use taskboard::shared::{Board, BoardList, Role, ServerEvent, User};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..ServerConfig::default()
    }
}

pub async fn create_user(store: &dyn BoardStore, name: &str) -> User {
    store
        .upsert_user(User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar_url: None,
        })
        .await
        .expect("Failed to create test user")
}

/// A board with two lists and three members of each role
pub struct TestBoard {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<PresenceRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub broadcaster: Broadcaster,
    pub owner: User,
    pub editor: User,
    pub viewer: User,
    pub board: Board,
    pub todo: BoardList,
    pub done: BoardList,
}

impl TestBoard {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let owner = create_user(store.as_ref(), "Owner").await;
        let editor = create_user(store.as_ref(), "Editor").await;
        let viewer = create_user(store.as_ref(), "Viewer").await;

        let board = store
            .create_board(&owner, "Sprint".into(), "#0079bf".into())
            .await
            .expect("Failed to create board");
        store.add_member(board.id, &editor, Role::Editor).await.unwrap();
        store.add_member(board.id, &viewer, Role::Viewer).await.unwrap();
        let todo = store.create_list(board.id, "Todo".into(), None).await.unwrap();
        let done = store.create_list(board.id, "Done".into(), None).await.unwrap();

        let registry = Arc::new(PresenceRegistry::new());
        let hub = Arc::new(ConnectionHub::new());
        let broadcaster = Broadcaster::new(registry.clone());
        broadcaster.attach_transport(hub.clone());

        Self {
            store,
            registry,
            hub,
            broadcaster,
            owner,
            editor,
            viewer,
            board,
            todo,
            done,
        }
    }

    /// Opens a socket for `user` without joining any room
    pub fn connect(&self, user: &User) -> (Connection, EventReceiver) {
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

    /// Opens a socket and joins the board, discarding the presence events
    pub async fn join(&self, user: &User) -> (Connection, EventReceiver) {
        let (mut connection, mut rx) = self.connect(user);
        connection
            .join_board(self.board.id)
            .await
            .expect("member should be able to join");
        drain(&mut rx);
        (connection, rx)
    }
}

/// Everything queued for a socket so far
pub fn drain(rx: &mut EventReceiver) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
