//! # Board API Client
//!
//! `BoardApi` is the seam between the optimistic layer and the network.
//! `HttpBoardApi` implements it over the REST surface with [`reqwest`],
//! decoding every response through the shared `ApiResponse` envelope.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::api::{
    AddMemberRequest, CreateBoardRequest, CreateCardRequest, CreateListRequest, MoveCardRequest,
    MovedCard, ReorderRequest, UpdateBoardRequest, UpdateCardRequest, UpdateListRequest,
    UpdateMemberRoleRequest,
};
use crate::shared::{
    ApiResponse, AppConfig, Board, BoardDetails, BoardList, BoardMember, Card, ConfigError,
    ErrorKind, PositionError,
};

/// Errors surfaced to the caller of a client operation
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error envelope
    #[error("{kind:?}: {message}")]
    Api { kind: ErrorKind, message: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body was not a valid envelope
    #[error("Unexpected response ({status}): {body}")]
    Decode { status: u16, body: String },

    /// The change was rejected locally before anything was sent
    #[error(transparent)]
    Position(#[from] PositionError),

    /// The entity is not in the local cache
    #[error("{0} is not loaded")]
    NotCached(&'static str),

    #[error("Realtime error: {0}")]
    Realtime(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the local view is stale and must be re-fetched
    pub fn requires_resync(&self) -> bool {
        self.kind().is_some_and(ErrorKind::requires_resync)
    }
}

/// Every remote operation the client performs
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, ClientError>;
    async fn create_board(&self, request: CreateBoardRequest) -> Result<Board, ClientError>;
    async fn board_details(&self, board_id: Uuid) -> Result<BoardDetails, ClientError>;
    async fn update_board(&self, board_id: Uuid, request: UpdateBoardRequest) -> Result<Board, ClientError>;
    async fn delete_board(&self, board_id: Uuid) -> Result<Board, ClientError>;

    async fn create_list(&self, board_id: Uuid, request: CreateListRequest) -> Result<BoardList, ClientError>;
    async fn update_list(&self, list_id: Uuid, request: UpdateListRequest) -> Result<BoardList, ClientError>;
    async fn delete_list(&self, list_id: Uuid) -> Result<BoardList, ClientError>;
    async fn reorder_lists(&self, board_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<BoardList>, ClientError>;

    async fn create_card(&self, list_id: Uuid, request: CreateCardRequest) -> Result<Card, ClientError>;
    async fn update_card(&self, card_id: Uuid, request: UpdateCardRequest) -> Result<Card, ClientError>;
    async fn delete_card(&self, card_id: Uuid) -> Result<Card, ClientError>;
    async fn move_card(&self, card_id: Uuid, request: MoveCardRequest) -> Result<MovedCard, ClientError>;
    async fn reorder_cards(&self, list_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<Card>, ClientError>;

    async fn add_member(&self, board_id: Uuid, request: AddMemberRequest) -> Result<BoardMember, ClientError>;
    async fn update_member_role(
        &self,
        board_id: Uuid,
        member_id: Uuid,
        request: UpdateMemberRoleRequest,
    ) -> Result<BoardMember, ClientError>;
    async fn remove_member(&self, board_id: Uuid, member_id: Uuid) -> Result<BoardMember, ClientError>;
}

/// REST client authenticated with a bearer token
#[derive(Debug, Clone)]
pub struct HttpBoardApi {
    client: Client,
    config: AppConfig,
    token: String,
}

impl HttpBoardApi {
    pub fn new(config: AppConfig, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), config, token)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling
    pub fn with_client(client: Client, config: AppConfig, token: impl Into<String>) -> Self {
        Self {
            client,
            config,
            token: token.into(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        self.config.api_url(path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<ApiResponse<T>>(&body) {
            Ok(envelope) => envelope.into_result().map_err(|error| {
                tracing::debug!(status = status.as_u16(), kind = ?error.kind, "[Api] Request failed");
                ClientError::Api {
                    kind: error.kind,
                    message: error.message,
                }
            }),
            Err(e) => {
                tracing::warn!(status = status.as_u16(), error = %e, "[Api] Undecodable response");
                Err(ClientError::Decode {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl BoardApi for HttpBoardApi {
    async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        self.send(self.client.get(self.url("/api/boards"))).await
    }

    async fn create_board(&self, request: CreateBoardRequest) -> Result<Board, ClientError> {
        self.send(self.client.post(self.url("/api/boards")).json(&request))
            .await
    }

    async fn board_details(&self, board_id: Uuid) -> Result<BoardDetails, ClientError> {
        self.send(self.client.get(self.url(&format!("/api/boards/{}", board_id))))
            .await
    }

    async fn update_board(&self, board_id: Uuid, request: UpdateBoardRequest) -> Result<Board, ClientError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/boards/{}", board_id)))
                .json(&request),
        )
        .await
    }

    async fn delete_board(&self, board_id: Uuid) -> Result<Board, ClientError> {
        self.send(self.client.delete(self.url(&format!("/api/boards/{}", board_id))))
            .await
    }

    async fn create_list(&self, board_id: Uuid, request: CreateListRequest) -> Result<BoardList, ClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/api/boards/{}/lists", board_id)))
                .json(&request),
        )
        .await
    }

    async fn update_list(&self, list_id: Uuid, request: UpdateListRequest) -> Result<BoardList, ClientError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/lists/{}", list_id)))
                .json(&request),
        )
        .await
    }

    async fn delete_list(&self, list_id: Uuid) -> Result<BoardList, ClientError> {
        self.send(self.client.delete(self.url(&format!("/api/lists/{}", list_id))))
            .await
    }

    async fn reorder_lists(&self, board_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<BoardList>, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/api/boards/{}/lists/reorder", board_id)))
                .json(&ReorderRequest { ids }),
        )
        .await
    }

    async fn create_card(&self, list_id: Uuid, request: CreateCardRequest) -> Result<Card, ClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/api/lists/{}/cards", list_id)))
                .json(&request),
        )
        .await
    }

    async fn update_card(&self, card_id: Uuid, request: UpdateCardRequest) -> Result<Card, ClientError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/cards/{}", card_id)))
                .json(&request),
        )
        .await
    }

    async fn delete_card(&self, card_id: Uuid) -> Result<Card, ClientError> {
        self.send(self.client.delete(self.url(&format!("/api/cards/{}", card_id))))
            .await
    }

    async fn move_card(&self, card_id: Uuid, request: MoveCardRequest) -> Result<MovedCard, ClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/api/cards/{}/move", card_id)))
                .json(&request),
        )
        .await
    }

    async fn reorder_cards(&self, list_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<Card>, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/api/lists/{}/cards/reorder", list_id)))
                .json(&ReorderRequest { ids }),
        )
        .await
    }

    async fn add_member(&self, board_id: Uuid, request: AddMemberRequest) -> Result<BoardMember, ClientError> {
        self.send(
            self.client
                .post(self.url(&format!("/api/boards/{}/members", board_id)))
                .json(&request),
        )
        .await
    }

    async fn update_member_role(
        &self,
        board_id: Uuid,
        member_id: Uuid,
        request: UpdateMemberRoleRequest,
    ) -> Result<BoardMember, ClientError> {
        self.send(
            self.client
                .patch(self.url(&format!("/api/boards/{}/members/{}", board_id, member_id)))
                .json(&request),
        )
        .await
    }

    async fn remove_member(&self, board_id: Uuid, member_id: Uuid) -> Result<BoardMember, ClientError> {
        self.send(
            self.client
                .delete(self.url(&format!("/api/boards/{}/members/{}", board_id, member_id))),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_requires_resync() {
        let not_found = ClientError::Api {
            kind: ErrorKind::NotFound,
            message: "Card not found".into(),
        };
        let forbidden = ClientError::Api {
            kind: ErrorKind::Forbidden,
            message: "Editor role required".into(),
        };
        assert!(not_found.requires_resync());
        assert!(!forbidden.requires_resync());
        assert!(!ClientError::NotCached("card").requires_resync());
    }
}
