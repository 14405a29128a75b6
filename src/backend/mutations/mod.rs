//! Board Mutations
//!
//! Every write to a board goes through one of these operations. Each one:
//!
//! 1. resolves the actor's access through the access gate
//! 2. validates the payload
//! 3. commits through the `BoardStore` as a single unit
//! 4. returns a `MutationOutcome` carrying the committed entity and the
//!    event that describes it
//!
//! Nothing is broadcast until the caller publishes the outcome, and a failed
//! mutation never produces an outcome, so rejected writes are never
//! broadcast.
//!
//! # Module Structure
//!
//! ```text
//! mutations/
//! ├── mod.rs      - MutationOutcome, shared validation
//! ├── boards.rs
//! ├── lists.rs
//! ├── cards.rs
//! └── members.rs
//! ```

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::Broadcaster;
use crate::shared::ServerEvent;

pub use crate::shared::api::MovedCard;

pub mod boards;
pub mod cards;
pub mod lists;
pub mod members;

const MAX_TITLE_LENGTH: usize = 255;
const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Room membership change that follows a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEffect {
    None,
    /// The user lost access to the board
    EvictUser(Uuid),
    /// The board no longer exists
    CloseRoom,
}

/// A committed mutation waiting to be announced
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub entity: T,
    pub board_id: Uuid,
    /// `None` when nobody can be listening yet (a brand new board)
    pub event: Option<ServerEvent>,
    pub room_effect: RoomEffect,
}

impl<T> MutationOutcome<T> {
    pub(crate) fn new(entity: T, board_id: Uuid, event: ServerEvent) -> Self {
        Self {
            entity,
            board_id,
            event: Some(event),
            room_effect: RoomEffect::None,
        }
    }

    pub(crate) fn silent(entity: T, board_id: Uuid) -> Self {
        Self {
            entity,
            board_id,
            event: None,
            room_effect: RoomEffect::None,
        }
    }

    pub(crate) fn with_room_effect(mut self, effect: RoomEffect) -> Self {
        self.room_effect = effect;
        self
    }

    /// Broadcasts the event to the board's room and hands back the entity
    pub fn publish(self, broadcaster: &Broadcaster) -> T {
        if let Some(event) = self.event {
            broadcaster.broadcast(self.board_id, event);
        }
        match self.room_effect {
            RoomEffect::None => {}
            RoomEffect::EvictUser(user_id) => {
                broadcaster.evict_user(self.board_id, user_id);
            }
            RoomEffect::CloseRoom => {
                broadcaster.close_room(self.board_id);
            }
        }
        self.entity
    }
}

/// Trims a title and checks it is present and not too long
pub(crate) fn validate_title(title: &str) -> Result<String, BackendError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BackendError::validation("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(BackendError::validation(
            "title",
            format!("Title must be at most {} characters", MAX_TITLE_LENGTH),
        ));
    }
    Ok(title.to_string())
}

pub(crate) fn validate_description(description: Option<String>) -> Result<Option<String>, BackendError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Err(BackendError::validation(
            "description",
            format!("Description must be at most {} characters", MAX_DESCRIPTION_LENGTH),
        )),
        other => Ok(other),
    }
}

pub(crate) fn validate_position(position: Option<i32>) -> Result<Option<i32>, BackendError> {
    match position {
        Some(p) if p < 0 => Err(BackendError::validation("position", "Position must not be negative")),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Backlog ").unwrap(), "Backlog");
        assert_matches!(validate_title("   "), Err(BackendError::SharedError(_)));
        assert!(validate_title(&"x".repeat(256)).is_err());
        assert!(validate_title(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_validate_position() {
        assert_eq!(validate_position(None).unwrap(), None);
        assert_eq!(validate_position(Some(0)).unwrap(), Some(0));
        assert!(validate_position(Some(-1)).is_err());
    }

    #[test]
    fn test_publish_without_transport_returns_entity() {
        let registry = std::sync::Arc::new(crate::backend::realtime::PresenceRegistry::new());
        let broadcaster = Broadcaster::new(registry);
        let board_id = Uuid::new_v4();
        let outcome = MutationOutcome::new(
            7,
            board_id,
            ServerEvent::BoardDeleted {
                board_id,
                user_id: Uuid::new_v4(),
            },
        )
        .with_room_effect(RoomEffect::CloseRoom);
        assert_eq!(outcome.publish(&broadcaster), 7);
    }
}
