use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::handlers::{ok, ApiResult};
use crate::backend::middleware::AuthUser;
use crate::backend::mutations::members;
use crate::backend::server::state::AppState;
use crate::shared::api::{AddMemberRequest, UpdateMemberRoleRequest};
use crate::shared::{ApiResponse, BoardMember};

/// `GET /api/boards/{id}/members`
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Vec<BoardMember>> {
    ok(members::list_members(state.store.as_ref(), &user, board_id).await?)
}

/// `POST /api/boards/{id}/members`
pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BoardMember>>), BackendError> {
    let outcome = members::add_member(state.store.as_ref(), &user, board_id, request).await?;
    let member = outcome.publish(&state.broadcaster);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(member))))
}

/// `PATCH /api/boards/{id}/members/{member_id}`
pub async fn update_member_role(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((board_id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRoleRequest>,
) -> ApiResult<BoardMember> {
    let outcome =
        members::update_member_role(state.store.as_ref(), &user, board_id, member_id, request).await?;
    ok(outcome.publish(&state.broadcaster))
}

/// `DELETE /api/boards/{id}/members/{member_id}`
pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((board_id, member_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<BoardMember> {
    let outcome = members::remove_member(state.store.as_ref(), &user, board_id, member_id).await?;
    ok(outcome.publish(&state.broadcaster))
}
