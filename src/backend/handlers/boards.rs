use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::handlers::{ok, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::mutations::boards;
use crate::backend::server::state::AppState;
use crate::shared::api::{CreateBoardRequest, UpdateBoardRequest};
use crate::shared::{ApiResponse, Board, BoardDetails};

/// `GET /api/boards`
pub async fn list_boards(State(state): State<AppState>, AuthUser(user): AuthUser) -> ApiResult<Vec<Board>> {
    ok(boards::list_boards(state.store.as_ref(), &user).await?)
}

/// `POST /api/boards`
pub async fn create_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Board>>), BackendError> {
    let outcome = boards::create_board(state.store.as_ref(), &user, request).await?;
    let board = outcome.publish(&state.broadcaster);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(board))))
}

/// `GET /api/boards/{id}`
pub async fn get_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
) -> ApiResult<BoardDetails> {
    ok(boards::board_details(state.store.as_ref(), &user, board_id).await?)
}

/// `PATCH /api/boards/{id}`
pub async fn update_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
    Json(request): Json<UpdateBoardRequest>,
) -> ApiResult<Board> {
    let outcome = boards::update_board(state.store.as_ref(), &user, board_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `DELETE /api/boards/{id}`
pub async fn delete_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Board> {
    let outcome = boards::delete_board(state.store.as_ref(), &user, board_id).await?;
    ok(outcome.publish(&state.broadcaster))
}
