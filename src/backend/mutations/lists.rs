use uuid::Uuid;

use crate::backend::access::{require_editor, require_member};
use crate::backend::error::BackendError;
use crate::backend::mutations::{validate_position, validate_title, MutationOutcome};
use crate::backend::store::BoardStore;
use crate::shared::api::{CreateListRequest, ReorderRequest, UpdateListRequest};
use crate::shared::{BoardList, ServerEvent, User};

async fn load_list(store: &dyn BoardStore, list_id: Uuid) -> Result<BoardList, BackendError> {
    store
        .get_list(list_id)
        .await?
        .ok_or_else(|| BackendError::not_found("List not found"))
}

pub async fn lists_for_board(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
) -> Result<Vec<BoardList>, BackendError> {
    require_member(store, board_id, actor.id).await?;
    Ok(store.lists_for_board(board_id).await?)
}

/// Appends, or inserts at `position` shifting later lists right
pub async fn create_list(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    request: CreateListRequest,
) -> Result<MutationOutcome<BoardList>, BackendError> {
    require_editor(store, board_id, actor.id).await?;
    let title = validate_title(&request.title)?;
    let position = validate_position(request.position)?;

    let list = store.create_list(board_id, title, position).await?;
    let event = ServerEvent::ListCreated {
        list: list.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(list, board_id, event))
}

/// Renames and/or moves the list within its board
pub async fn update_list(
    store: &dyn BoardStore,
    actor: &User,
    list_id: Uuid,
    mut request: UpdateListRequest,
) -> Result<MutationOutcome<BoardList>, BackendError> {
    let board_id = load_list(store, list_id).await?.board_id;
    require_editor(store, board_id, actor.id).await?;
    if let Some(title) = request.title.as_deref() {
        request.title = Some(validate_title(title)?);
    }
    validate_position(request.position)?;

    let list = store.update_list(list_id, request).await?;
    let event = ServerEvent::ListUpdated {
        list: list.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(list, board_id, event))
}

/// Deletes the list and its cards; later lists shift left
pub async fn delete_list(
    store: &dyn BoardStore,
    actor: &User,
    list_id: Uuid,
) -> Result<MutationOutcome<BoardList>, BackendError> {
    let board_id = load_list(store, list_id).await?.board_id;
    require_editor(store, board_id, actor.id).await?;

    let list = store.delete_list(list_id).await?;
    let event = ServerEvent::ListDeleted {
        list_id,
        board_id,
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(list, board_id, event))
}

/// Applies a full new order; `ids` must be exactly the board's lists
pub async fn reorder_lists(
    store: &dyn BoardStore,
    actor: &User,
    board_id: Uuid,
    request: ReorderRequest,
) -> Result<MutationOutcome<Vec<BoardList>>, BackendError> {
    require_editor(store, board_id, actor.id).await?;

    let lists = store.reorder_lists(board_id, &request.ids).await?;
    let event = ServerEvent::ListReordered {
        board_id,
        lists: lists.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(lists, board_id, event))
}
