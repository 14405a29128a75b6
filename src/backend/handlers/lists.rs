use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::handlers::{ok, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::mutations::lists;
use crate::backend::server::state::AppState;
use crate::shared::api::{CreateListRequest, ReorderRequest, UpdateListRequest};
use crate::shared::{ApiResponse, BoardList};

/// `GET /api/boards/{id}/lists`
pub async fn list_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Vec<BoardList>> {
    ok(lists::lists_for_board(state.store.as_ref(), &user, board_id).await?)
}

/// `POST /api/boards/{id}/lists`
pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardList>>), BackendError> {
    let outcome = lists::create_list(state.store.as_ref(), &user, board_id, request).await?;
    let list = outcome.publish(&state.broadcaster);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(list))))
}

/// `PATCH /api/lists/{id}`
pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<Uuid>,
    Json(request): Json<UpdateListRequest>,
) -> ApiResult<BoardList> {
    let outcome = lists::update_list(state.store.as_ref(), &user, list_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `DELETE /api/lists/{id}`
pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(list_id): Path<Uuid>,
) -> ApiResult<BoardList> {
    let outcome = lists::delete_list(state.store.as_ref(), &user, list_id).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `PUT /api/boards/{id}/lists/reorder`
pub async fn reorder_lists(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Vec<BoardList>> {
    let outcome = lists::reorder_lists(state.store.as_ref(), &user, board_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}
