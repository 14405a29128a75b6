/**
 * Realtime Event System
 *
 * Every frame on the board socket is a JSON object `{"event": name, "data": {...}}`.
 * `ServerEvent` is the server → client taxonomy, `ClientMessage` the two
 * commands a client may send. Both sides share these types so the names and
 * payload shapes can only drift together.
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::models::{ActiveUser, Board, BoardList, BoardMember, Card};

/// Event pushed from the server to every socket in a board room
///
/// `user_id` is the actor, so a client can tell its own echoes apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    #[serde(rename = "board:updated")]
    BoardUpdated { board: Board, user_id: Uuid },

    #[serde(rename = "board:deleted")]
    BoardDeleted { board_id: Uuid, user_id: Uuid },

    #[serde(rename = "list:created")]
    ListCreated { list: BoardList, user_id: Uuid },

    #[serde(rename = "list:updated")]
    ListUpdated { list: BoardList, user_id: Uuid },

    #[serde(rename = "list:reordered")]
    ListReordered {
        board_id: Uuid,
        lists: Vec<BoardList>,
        user_id: Uuid,
    },

    #[serde(rename = "list:deleted")]
    ListDeleted {
        list_id: Uuid,
        board_id: Uuid,
        user_id: Uuid,
    },

    #[serde(rename = "card:created")]
    CardCreated { card: Card, user_id: Uuid },

    #[serde(rename = "card:updated")]
    CardUpdated { card: Card, user_id: Uuid },

    #[serde(rename = "card:deleted")]
    CardDeleted {
        card_id: Uuid,
        list_id: Uuid,
        board_id: Uuid,
        user_id: Uuid,
    },

    #[serde(rename = "card:moved")]
    CardMoved {
        card: Card,
        from_list_id: Uuid,
        user_id: Uuid,
    },

    #[serde(rename = "card:reordered")]
    CardReordered {
        list_id: Uuid,
        cards: Vec<Card>,
        user_id: Uuid,
    },

    #[serde(rename = "member:added")]
    MemberAdded { member: BoardMember, user_id: Uuid },

    #[serde(rename = "member:updated")]
    MemberUpdated { member: BoardMember, user_id: Uuid },

    #[serde(rename = "member:removed")]
    MemberRemoved {
        board_id: Uuid,
        member_id: Uuid,
        user_id: Uuid,
    },

    /// Full presence snapshot for a board, never a delta
    #[serde(rename = "users:active")]
    UsersActive { board_id: Uuid, users: Vec<ActiveUser> },

    /// Sent to a single socket only
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::BoardUpdated { .. } => "board:updated",
            ServerEvent::BoardDeleted { .. } => "board:deleted",
            ServerEvent::ListCreated { .. } => "list:created",
            ServerEvent::ListUpdated { .. } => "list:updated",
            ServerEvent::ListReordered { .. } => "list:reordered",
            ServerEvent::ListDeleted { .. } => "list:deleted",
            ServerEvent::CardCreated { .. } => "card:created",
            ServerEvent::CardUpdated { .. } => "card:updated",
            ServerEvent::CardDeleted { .. } => "card:deleted",
            ServerEvent::CardMoved { .. } => "card:moved",
            ServerEvent::CardReordered { .. } => "card:reordered",
            ServerEvent::MemberAdded { .. } => "member:added",
            ServerEvent::MemberUpdated { .. } => "member:updated",
            ServerEvent::MemberRemoved { .. } => "member:removed",
            ServerEvent::UsersActive { .. } => "users:active",
            ServerEvent::Error { .. } => "error",
        }
    }

    /// User whose mutation produced this event, if any
    pub fn actor(&self) -> Option<Uuid> {
        match self {
            ServerEvent::BoardUpdated { user_id, .. }
            | ServerEvent::BoardDeleted { user_id, .. }
            | ServerEvent::ListCreated { user_id, .. }
            | ServerEvent::ListUpdated { user_id, .. }
            | ServerEvent::ListReordered { user_id, .. }
            | ServerEvent::ListDeleted { user_id, .. }
            | ServerEvent::CardCreated { user_id, .. }
            | ServerEvent::CardUpdated { user_id, .. }
            | ServerEvent::CardDeleted { user_id, .. }
            | ServerEvent::CardMoved { user_id, .. }
            | ServerEvent::CardReordered { user_id, .. }
            | ServerEvent::MemberAdded { user_id, .. }
            | ServerEvent::MemberUpdated { user_id, .. }
            | ServerEvent::MemberRemoved { user_id, .. } => Some(*user_id),
            ServerEvent::UsersActive { .. } | ServerEvent::Error { .. } => None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Command sent from a client to the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "join-board")]
    JoinBoard { board_id: Uuid },

    #[serde(rename = "leave-board")]
    LeaveBoard { board_id: Uuid },
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardRef {
    board_id: Uuid,
}

impl ClientMessage {
    /// Decodes one text frame
    ///
    /// Distinguishes a frame that is not JSON at all, an event name nobody
    /// handles, and a known event with a malformed payload, so each can be
    /// reported back to the socket with its own message.
    pub fn parse(text: &str) -> Result<Self, SharedError> {
        let frame: Frame = serde_json::from_str(text)?;
        match frame.event.as_str() {
            "join-board" => Ok(ClientMessage::JoinBoard {
                board_id: board_ref(frame.data)?,
            }),
            "leave-board" => Ok(ClientMessage::LeaveBoard {
                board_id: board_ref(frame.data)?,
            }),
            other => Err(SharedError::unknown_event(other)),
        }
    }

    pub fn board_id(&self) -> Uuid {
        match self {
            ClientMessage::JoinBoard { board_id } | ClientMessage::LeaveBoard { board_id } => {
                *board_id
            }
        }
    }

    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn board_ref(data: Value) -> Result<Uuid, SharedError> {
    serde_json::from_value::<BoardRef>(data)
        .map(|r| r.board_id)
        .map_err(|_| SharedError::validation("boardId", "a valid boardId is required"))
}
