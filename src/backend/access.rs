//! Board Access Gate
//!
//! Answers "may this user act on this board, and with which role". Every
//! mutation and every `join-board` goes through here; nothing caches the
//! answer, so a membership change takes effect on the next request.

use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::store::BoardStore;
use crate::shared::Role;

/// Resolved permissions of one user on one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAccess {
    pub has_access: bool,
    /// `None` when the user is not a member
    pub role: Option<Role>,
    pub owner_id: Uuid,
    pub is_owner: bool,
}

impl BoardAccess {
    /// Turns a denied access into `Forbidden`
    pub fn require(self) -> Result<Self, BackendError> {
        if self.has_access {
            return Ok(self);
        }
        match self.role {
            None => Err(BackendError::forbidden("You do not have access to this board")),
            Some(_) => Err(BackendError::forbidden("Editor role required")),
        }
    }
}

/// Looks up the board and the user's membership on it
///
/// With `require_editor`, a viewer resolves to `has_access = false`. A
/// missing board is `NotFound`.
pub async fn resolve_access(
    store: &dyn BoardStore,
    board_id: Uuid,
    user_id: Uuid,
    require_editor: bool,
) -> Result<BoardAccess, BackendError> {
    let board = store
        .get_board(board_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Board not found"))?;
    let role = store.get_member(board_id, user_id).await?.map(|m| m.role);
    let has_access = match role {
        Some(role) => !require_editor || role.can_edit(),
        None => false,
    };
    Ok(BoardAccess {
        has_access,
        role,
        owner_id: board.owner_id,
        is_owner: board.owner_id == user_id,
    })
}

/// Any membership
pub async fn require_member(
    store: &dyn BoardStore,
    board_id: Uuid,
    user_id: Uuid,
) -> Result<BoardAccess, BackendError> {
    resolve_access(store, board_id, user_id, false).await?.require()
}

/// Owner or editor
pub async fn require_editor(
    store: &dyn BoardStore,
    board_id: Uuid,
    user_id: Uuid,
) -> Result<BoardAccess, BackendError> {
    resolve_access(store, board_id, user_id, true).await?.require()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::User;
    use assert_matches::assert_matches;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_roles_resolve() {
        let store = MemoryStore::new();
        let owner = store.upsert_user(user("owner")).await.unwrap();
        let viewer = store.upsert_user(user("viewer")).await.unwrap();
        let stranger = store.upsert_user(user("stranger")).await.unwrap();
        let board = store
            .create_board(&owner, "B".to_string(), "#fff".to_string())
            .await
            .unwrap();
        store.add_member(board.id, &viewer, Role::Viewer).await.unwrap();

        let owner_access = resolve_access(&store, board.id, owner.id, true).await.unwrap();
        assert!(owner_access.has_access);
        assert!(owner_access.is_owner);

        let viewer_read = resolve_access(&store, board.id, viewer.id, false).await.unwrap();
        assert!(viewer_read.has_access);
        let viewer_write = resolve_access(&store, board.id, viewer.id, true).await.unwrap();
        assert!(!viewer_write.has_access);
        assert_eq!(viewer_write.role, Some(Role::Viewer));

        assert_matches!(
            require_member(&store, board.id, stranger.id).await,
            Err(BackendError::Forbidden(_))
        );
        assert_matches!(
            require_editor(&store, Uuid::new_v4(), owner.id).await,
            Err(BackendError::NotFound(_))
        );
    }
}
