use uuid::Uuid;

use crate::backend::access::{require_editor, require_member};
use crate::backend::error::BackendError;
use crate::backend::mutations::{
    validate_description, validate_position, validate_title, MovedCard, MutationOutcome,
};
use crate::backend::store::{BoardStore, NewCard};
use crate::shared::api::{CreateCardRequest, MoveCardRequest, ReorderRequest, UpdateCardRequest};
use crate::shared::{BoardList, Card, ServerEvent, User};

async fn load_list(store: &dyn BoardStore, list_id: Uuid) -> Result<BoardList, BackendError> {
    store
        .get_list(list_id)
        .await?
        .ok_or_else(|| BackendError::not_found("List not found"))
}

/// The card and the board it lives on
async fn load_card(store: &dyn BoardStore, card_id: Uuid) -> Result<(Card, Uuid), BackendError> {
    let card = store
        .get_card(card_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Card not found"))?;
    let board_id = load_list(store, card.list_id).await?.board_id;
    Ok((card, board_id))
}

pub async fn cards_for_list(
    store: &dyn BoardStore,
    actor: &User,
    list_id: Uuid,
) -> Result<Vec<Card>, BackendError> {
    let list = load_list(store, list_id).await?;
    require_member(store, list.board_id, actor.id).await?;
    Ok(store.cards_for_list(list_id).await?)
}

pub async fn create_card(
    store: &dyn BoardStore,
    actor: &User,
    list_id: Uuid,
    request: CreateCardRequest,
) -> Result<MutationOutcome<Card>, BackendError> {
    let board_id = load_list(store, list_id).await?.board_id;
    require_editor(store, board_id, actor.id).await?;
    let new_card = NewCard {
        title: validate_title(&request.title)?,
        description: validate_description(request.description)?,
        due_date: request.due_date,
    };
    let position = validate_position(request.position)?;

    let card = store.create_card(list_id, new_card, position).await?;
    let event = ServerEvent::CardCreated {
        card: card.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(card, board_id, event))
}

/// Edits fields and/or moves the card within its list
pub async fn update_card(
    store: &dyn BoardStore,
    actor: &User,
    card_id: Uuid,
    mut request: UpdateCardRequest,
) -> Result<MutationOutcome<Card>, BackendError> {
    let (_, board_id) = load_card(store, card_id).await?;
    require_editor(store, board_id, actor.id).await?;
    if let Some(title) = request.title.as_deref() {
        request.title = Some(validate_title(title)?);
    }
    request.description = validate_description(request.description)?;
    validate_position(request.position)?;

    let card = store.update_card(card_id, request).await?;
    let event = ServerEvent::CardUpdated {
        card: card.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(card, board_id, event))
}

pub async fn delete_card(
    store: &dyn BoardStore,
    actor: &User,
    card_id: Uuid,
) -> Result<MutationOutcome<Card>, BackendError> {
    let (card, board_id) = load_card(store, card_id).await?;
    require_editor(store, board_id, actor.id).await?;

    let deleted = store.delete_card(card_id).await?;
    let event = ServerEvent::CardDeleted {
        card_id,
        list_id: card.list_id,
        board_id,
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(deleted, board_id, event))
}

/// Moves a card to another list of the same board, or within its own list
///
/// A target list on a different board is reported as not found and nothing
/// changes.
pub async fn move_card(
    store: &dyn BoardStore,
    actor: &User,
    card_id: Uuid,
    request: MoveCardRequest,
) -> Result<MutationOutcome<MovedCard>, BackendError> {
    let (card, board_id) = load_card(store, card_id).await?;
    let target = load_list(store, request.to_list_id).await?;
    if target.board_id != board_id {
        tracing::info!(
            %card_id,
            to_list_id = %target.id,
            "[Board] Rejected card move across boards"
        );
        return Err(BackendError::not_found("List not found"));
    }
    require_editor(store, board_id, actor.id).await?;
    let position = validate_position(request.position)?;

    let from_list_id = card.list_id;
    let moved = store.move_card(card_id, target.id, position).await?;
    let event = ServerEvent::CardMoved {
        card: moved.clone(),
        from_list_id,
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(
        MovedCard {
            card: moved,
            from_list_id,
        },
        board_id,
        event,
    ))
}

/// Applies a full new order; `ids` must be exactly the list's cards
pub async fn reorder_cards(
    store: &dyn BoardStore,
    actor: &User,
    list_id: Uuid,
    request: ReorderRequest,
) -> Result<MutationOutcome<Vec<Card>>, BackendError> {
    let board_id = load_list(store, list_id).await?.board_id;
    require_editor(store, board_id, actor.id).await?;

    let cards = store.reorder_cards(list_id, &request.ids).await?;
    let event = ServerEvent::CardReordered {
        list_id,
        cards: cards.clone(),
        user_id: actor.id,
    };
    Ok(MutationOutcome::new(cards, board_id, event))
}
