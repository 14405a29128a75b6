/**
 * Error Conversion
 *
 * `IntoResponse` for `BackendError`, plus conversions from the store and the
 * auth handshake so `?` works across layers.
 *
 * # Response Format
 *
 * ```json
 * { "status": "error", "error": { "kind": "forbidden", "message": "..." } }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::auth::handshake::AuthError;
use crate::backend::error::types::BackendError;
use crate::backend::store::StoreError;
use crate::shared::position::PositionError;
use crate::shared::{ApiResponse, SharedError};

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Api] {}", self);
        } else {
            tracing::debug!("[Api] {} -> {}", status, self);
        }
        let body: ApiResponse<()> = ApiResponse::error(self.kind(), self.message());
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => BackendError::NotFound(format!("{} not found", capitalize(what))),
            StoreError::Conflict(message) => BackendError::Conflict(message),
            StoreError::Position(PositionError::UnknownEntity(id)) => {
                BackendError::NotFound(format!("{} does not belong to this container", id))
            }
            StoreError::Position(err @ PositionError::LengthMismatch { .. }) => {
                BackendError::NotFound(format!("Ordering is stale: {}", err))
            }
            StoreError::Position(err @ PositionError::Negative(_)) => {
                BackendError::SharedError(SharedError::validation("position", err.to_string()))
            }
            StoreError::Position(err) => {
                BackendError::SharedError(SharedError::validation("ids", err.to_string()))
            }
            StoreError::Database(err) => BackendError::Internal(err.to_string()),
        }
    }
}

impl From<AuthError> for BackendError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(err) => err.into(),
            other => BackendError::Unauthorized(other.to_string()),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_error_body_is_tagged_envelope() {
        let response = BackendError::forbidden("Editor role required").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "status": "error",
                "error": {"kind": "forbidden", "message": "Editor role required"}
            })
        );
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let not_found: BackendError = StoreError::NotFound("card").into();
        assert_eq!(not_found.message(), "Card not found");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let stale: BackendError = StoreError::Position(PositionError::UnknownEntity(Uuid::nil())).into();
        assert_eq!(stale.status_code(), StatusCode::NOT_FOUND);

        let mismatch: BackendError =
            StoreError::Position(PositionError::LengthMismatch { expected: 3, got: 2 }).into();
        assert_eq!(mismatch.status_code(), StatusCode::NOT_FOUND);
        assert!(mismatch.message().starts_with("Ordering is stale"));

        let duplicate: BackendError = StoreError::Position(PositionError::DuplicateId(Uuid::nil())).into();
        assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        let err: BackendError = AuthError::TokenExpired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "token expired");
    }
}
