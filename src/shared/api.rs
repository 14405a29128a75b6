//! HTTP API Types
//!
//! Request payloads for the board REST surface and the tagged envelope every
//! response is wrapped in.
//!
//! # Response Envelope
//!
//! ```json
//! { "status": "success", "data": { ... } }
//! { "status": "error", "error": { "kind": "not_found", "message": "Card not found" } }
//! ```
//!
//! Both the server handlers and the client decode through [`ApiResponse`], so
//! a success can never be mistaken for an error with a missing field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::models::{Card, Role};

/// Tagged result of one API call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { error: ApiError },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse::Success { data }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiResponse::Error {
            error: ApiError {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Success { data } => Ok(data),
            ApiResponse::Error { error } => Err(error),
        }
    }
}

/// Error half of the envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Coarse error category, stable across the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Whether the caller must re-sync instead of retrying
    pub fn requires_resync(self) -> bool {
        matches!(self, ErrorKind::NotFound)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoardRequest {
    pub title: String,
    #[serde(default)]
    pub bg_color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bg_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    pub title: String,
    /// Omitted means append
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// Moves the list inside its board
    #[serde(default)]
    pub position: Option<i32>,
}

/// Full new order of a container, by id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Moves the card inside its list
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoveCardRequest {
    pub to_list_id: Uuid,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Response of a card move, with the list the card left
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovedCard {
    pub card: Card,
    pub from_list_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRoleRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let value = serde_json::to_value(ApiResponse::success(json!({"id": 1}))).unwrap();
        assert_eq!(value, json!({"status": "success", "data": {"id": 1}}));
    }

    #[test]
    fn test_error_envelope() {
        let response: ApiResponse<()> = ApiResponse::error(ErrorKind::NotFound, "Card not found");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "error": {"kind": "not_found", "message": "Card not found"}})
        );
        let back: ApiResponse<()> = serde_json::from_value(value).unwrap();
        assert!(back.into_result().unwrap_err().kind.requires_resync());
    }

    #[test]
    fn test_move_request_position_optional() {
        let id = Uuid::new_v4();
        let req: MoveCardRequest = serde_json::from_value(json!({"toListId": id})).unwrap();
        assert_eq!(req.to_list_id, id);
        assert_eq!(req.position, None);
    }
}
