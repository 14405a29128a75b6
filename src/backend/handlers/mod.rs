//! HTTP Handlers
//!
//! Thin Axum adapters over the mutation layer: extract the caller and the
//! payload, run the operation, publish the outcome to the board's room, and
//! wrap the committed entity in `ApiResponse::Success`.
//!
//! Errors come back as `BackendError`, whose `IntoResponse` renders the
//! `ApiResponse::Error` envelope with the matching status.

pub mod boards;
pub mod cards;
pub mod lists;
pub mod members;

use axum::Json;

use crate::backend::error::BackendError;
use crate::shared::ApiResponse;

/// Result type of every JSON handler
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, BackendError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// `GET /health`
pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}
