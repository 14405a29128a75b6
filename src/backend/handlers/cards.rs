use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::handlers::{ok, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::mutations::{cards, MovedCard};
use crate::backend::server::state::AppState;
use crate::shared::api::{CreateCardRequest, MoveCardRequest, ReorderRequest, UpdateCardRequest};
use crate::shared::{ApiResponse, Card};

/// `GET /api/lists/{id}/cards`
pub async fn list_cards(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<Uuid>,
) -> ApiResult<Vec<Card>> {
    ok(cards::cards_for_list(state.store.as_ref(), &user, list_id).await?)
}

/// `POST /api/lists/{id}/cards`
pub async fn create_card(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<Uuid>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>), BackendError> {
    let outcome = cards::create_card(state.store.as_ref(), &user, list_id, request).await?;
    let card = outcome.publish(&state.broadcaster);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(card))))
}

/// `PATCH /api/cards/{id}`
pub async fn update_card(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(card_id): Path<Uuid>,
    Json(request): Json<UpdateCardRequest>,
) -> ApiResult<Card> {
    let outcome = cards::update_card(state.store.as_ref(), &user, card_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `DELETE /api/cards/{id}`
pub async fn delete_card(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(card_id): Path<Uuid>,
) -> ApiResult<Card> {
    let outcome = cards::delete_card(state.store.as_ref(), &user, card_id).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `POST /api/cards/{id}/move`
pub async fn move_card(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(card_id): Path<Uuid>,
    Json(request): Json<MoveCardRequest>,
) -> ApiResult<MovedCard> {
    let outcome = cards::move_card(state.store.as_ref(), &user, card_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `PUT /api/lists/{id}/cards/reorder`
pub async fn reorder_cards(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Vec<Card>> {
    let outcome = cards::reorder_cards(state.store.as_ref(), &user, list_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}
