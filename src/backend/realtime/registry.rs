//! Presence Registry
//!
//! Process-wide map of which connections sit in which board room:
//! `board_id → (socket_id → ConnectionIdentity)`.
//!
//! The map lives behind one `std::sync::Mutex`. Every method takes the lock,
//! finishes, and releases it before returning, so no lock is ever held
//! across an `.await` and concurrent joins, leaves and disconnects apply one
//! at a time.
//!
//! Empty rooms are removed eagerly; `room_count()` only counts boards with at
//! least one connection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::shared::{ActiveUser, User};

/// Identifier of one WebSocket connection
pub type SocketId = Uuid;

/// Who is behind a connection, fixed at handshake time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub socket_id: SocketId,
    pub user_id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl ConnectionIdentity {
    pub fn new(socket_id: SocketId, user: &User) -> Self {
        Self {
            socket_id,
            user_id: user.id,
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

type Rooms = HashMap<Uuid, HashMap<SocketId, ConnectionIdentity>>;

/// Board room membership for every live connection
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    rooms: Mutex<Rooms>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms(&self) -> MutexGuard<'_, Rooms> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds the connection to a board room; joining twice is a no-op
    pub fn join(&self, board_id: Uuid, identity: ConnectionIdentity) {
        let mut rooms = self.rooms();
        tracing::debug!(
            %board_id,
            socket_id = %identity.socket_id,
            user_id = %identity.user_id,
            "[Presence] join"
        );
        rooms
            .entry(board_id)
            .or_default()
            .insert(identity.socket_id, identity);
    }

    /// Removes the connection from a board room
    ///
    /// Returns whether the connection was in the room.
    pub fn leave(&self, board_id: Uuid, socket_id: SocketId) -> bool {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(&board_id) else {
            return false;
        };
        let removed = room.remove(&socket_id).is_some();
        if room.is_empty() {
            rooms.remove(&board_id);
        }
        if removed {
            tracing::debug!(%board_id, %socket_id, "[Presence] leave");
        }
        removed
    }

    /// Users present on a board, one entry per user, sorted by name
    pub fn active_users(&self, board_id: Uuid) -> Vec<ActiveUser> {
        let rooms = self.rooms();
        let Some(room) = rooms.get(&board_id) else {
            return Vec::new();
        };
        let mut by_user: BTreeMap<Uuid, ActiveUser> = BTreeMap::new();
        for identity in room.values() {
            by_user.entry(identity.user_id).or_insert_with(|| ActiveUser {
                id: identity.user_id,
                name: identity.name.clone(),
                avatar_url: identity.avatar_url.clone(),
            });
        }
        let mut users: Vec<ActiveUser> = by_user.into_values().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        users
    }

    /// Connections currently in a board room
    pub fn sockets_in(&self, board_id: Uuid) -> Vec<SocketId> {
        self.rooms()
            .get(&board_id)
            .map(|room| room.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Boards a connection is currently in
    pub fn rooms_of(&self, socket_id: SocketId) -> Vec<Uuid> {
        self.rooms()
            .iter()
            .filter(|(_, room)| room.contains_key(&socket_id))
            .map(|(board_id, _)| *board_id)
            .collect()
    }

    /// Drops a connection from every room it is in
    ///
    /// Returns the boards it was removed from, so presence can be re-emitted
    /// for each.
    pub fn remove_connection_everywhere(&self, socket_id: SocketId) -> Vec<Uuid> {
        let mut rooms = self.rooms();
        let mut affected = Vec::new();
        rooms.retain(|board_id, room| {
            if room.remove(&socket_id).is_some() {
                affected.push(*board_id);
            }
            !room.is_empty()
        });
        if !affected.is_empty() {
            tracing::debug!(%socket_id, rooms = affected.len(), "[Presence] connection removed");
        }
        affected
    }

    /// Removes every connection of one user from a board room
    pub fn remove_user(&self, board_id: Uuid, user_id: Uuid) -> Vec<SocketId> {
        let mut rooms = self.rooms();
        let Some(room) = rooms.get_mut(&board_id) else {
            return Vec::new();
        };
        let evicted: Vec<SocketId> = room
            .values()
            .filter(|identity| identity.user_id == user_id)
            .map(|identity| identity.socket_id)
            .collect();
        for socket_id in &evicted {
            room.remove(socket_id);
        }
        if room.is_empty() {
            rooms.remove(&board_id);
        }
        evicted
    }

    /// Empties a board room, returning the connections that were in it
    pub fn close_room(&self, board_id: Uuid) -> Vec<SocketId> {
        self.rooms()
            .remove(&board_id)
            .map(|room| room.into_keys().collect())
            .unwrap_or_default()
    }

    /// Number of boards with at least one connection
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }
}
