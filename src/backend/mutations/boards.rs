use uuid::Uuid;

use crate::backend::access::{require_editor, require_member, resolve_access};
use crate::backend::error::BackendError;
use crate::backend::mutations::{validate_title, MutationOutcome, RoomEffect};
use crate::backend::store::BoardStore;
use crate::shared::api::{CreateBoardRequest, UpdateBoardRequest};
use crate::shared::{Board, BoardDetails, ServerEvent, User};

pub const DEFAULT_BG_COLOR: &str = "#0079bf";

/// Boards the user belongs to
pub async fn list_boards(store: &dyn BoardStore, actor: &User) -> Result<Vec<Board>, BackendError> {
    Ok(store.boards_for_user(actor.id).await?)
}

/// Canonical snapshot of one board; what clients load and re-sync from
pub async fn board_details(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
) -> Result<BoardDetails, BackendError> {
    require_member(store, board_id, actor.id).await?;
    let board = store
        .get_board(board_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Board not found"))?;
    Ok(BoardDetails {
        board,
        lists: store.lists_for_board(board_id).await?,
        cards: store.cards_for_board(board_id).await?,
        members: store.members_for_board(board_id).await?,
    })
}

/// The creator becomes the board's `OWNER` member
pub async fn create_board(
    store: &dyn BoardStore,
    actor: &User,
    request: CreateBoardRequest,
) -> Result<MutationOutcome<Board>, BackendError> {
    let title = validate_title(&request.title)?;
    let bg_color = request
        .bg_color
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_BG_COLOR.to_string());

    let board = store.create_board(actor, title, bg_color).await?;
    tracing::info!(board_id = %board.id, owner_id = %actor.id, "[Board] Created");
    let board_id = board.id;
    Ok(MutationOutcome::silent(board, board_id))
}

/// Owner or editor
pub async fn update_board(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    mut request: UpdateBoardRequest,
) -> Result<MutationOutcome<Board>, BackendError> {
    require_editor(store, board_id, actor.id).await?;
    if let Some(title) = request.title.as_deref() {
        request.title = Some(validate_title(title)?);
    }
    request.bg_color = request
        .bg_color
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let board = store.update_board(board_id, request).await?;
    let event = ServerEvent::BoardUpdated {
        board: board.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(board, board_id, event))
}

/// Owner only; takes lists, cards and memberships with it
pub async fn delete_board(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
) -> Result<MutationOutcome<Board>, BackendError> {
    let access = resolve_access(store, board_id, actor.id, false).await?.require()?;
    if !access.is_owner {
        return Err(BackendError::forbidden("Only the board owner can delete it"));
    }

    let board = store.delete_board(board_id).await?;
    tracing::info!(%board_id, "[Board] Deleted");
    let event = ServerEvent::BoardDeleted {
        board_id,
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(board, board_id, event).with_room_effect(RoomEffect::CloseRoom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::Role;
    use assert_matches::assert_matches;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .upsert_user(User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: format!("{}@example.com", name),
                avatar_url: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_board_defaults_color_and_owner() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let outcome = create_board(
            &store,
            &alice,
            CreateBoardRequest {
                title: " Roadmap ".to_string(),
                bg_color: None,
            },
        )
        .await
        .unwrap();
        assert!(outcome.event.is_none());
        assert_eq!(outcome.entity.title, "Roadmap");
        assert_eq!(outcome.entity.bg_color, DEFAULT_BG_COLOR);

        let details = board_details(&store, &alice, outcome.board_id).await.unwrap();
        assert_eq!(details.members.len(), 1);
        assert_eq!(details.members[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn test_update_needs_editor_and_delete_needs_owner() {
        let store = MemoryStore::new();
        let owner = user(&store, "owner").await;
        let editor = user(&store, "editor").await;
        let viewer = user(&store, "viewer").await;
        let board = store
            .create_board(&owner, "B".into(), DEFAULT_BG_COLOR.into())
            .await
            .unwrap();
        store.add_member(board.id, &editor, Role::Editor).await.unwrap();
        store.add_member(board.id, &viewer, Role::Viewer).await.unwrap();

        let rename = UpdateBoardRequest {
            title: Some("Renamed".into()),
            bg_color: None,
        };
        assert_matches!(
            update_board(&store, &viewer, board.id, rename.clone()).await,
            Err(BackendError::Forbidden(_))
        );
        let outcome = update_board(&store, &editor, board.id, rename).await.unwrap();
        assert_matches!(outcome.event, Some(ServerEvent::BoardUpdated { .. }));

        assert_matches!(
            delete_board(&store, &editor, board.id).await,
            Err(BackendError::Forbidden(_))
        );
        let outcome = delete_board(&store, &owner, board.id).await.unwrap();
        assert_eq!(outcome.room_effect, RoomEffect::CloseRoom);
        assert!(store.get_board(board.id).await.unwrap().is_none());
    }
}
