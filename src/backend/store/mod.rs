//! Board Persistence
//!
//! The `BoardStore` trait is everything the mutation layer needs from storage:
//! entity CRUD plus the position-maintaining operations (insert, move,
//! reorder) that must commit as one unit.
//!
//! # Implementations
//!
//! - **`MemoryStore`** - `HashMap` tables behind one `RwLock`; each operation
//!   runs entirely under a single write guard
//! - **`PgStore`** - PostgreSQL via `sqlx`; each operation runs in one
//!   transaction and locks the affected container rows with `FOR UPDATE`
//!   before shifting positions
//!
//! Authorization is not checked here. Callers go through the access gate
//! first; the store trusts its inputs apart from existence checks.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::shared::api::{UpdateBoardRequest, UpdateCardRequest, UpdateListRequest};
use crate::shared::position::PositionError;
use crate::shared::{Board, BoardList, BoardMember, Card, Role, User};

/// In-memory store
pub mod memory;

/// PostgreSQL store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    /// A position operation was rejected before anything was written
    #[error(transparent)]
    Position(#[from] PositionError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields of a new card
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Storage for boards, lists, cards and memberships
///
/// Every method that writes positions leaves the affected containers dense
/// (`0..n`) or fails without writing anything.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Inserts the user or refreshes its display fields
    async fn upsert_user(&self, user: User) -> Result<User, StoreError>;

    /// Boards the user is a member of
    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError>;
    async fn get_board(&self, id: Uuid) -> Result<Option<Board>, StoreError>;
    /// Creates the board and makes `owner` its `OWNER` member
    async fn create_board(
        &self,
        owner: &User,
        title: String,
        bg_color: String,
    ) -> Result<Board, StoreError>;
    async fn update_board(&self, id: Uuid, patch: UpdateBoardRequest) -> Result<Board, StoreError>;
    /// Deletes the board with its lists, cards and memberships
    async fn delete_board(&self, id: Uuid) -> Result<Board, StoreError>;

    async fn get_list(&self, id: Uuid) -> Result<Option<BoardList>, StoreError>;
    /// Lists of a board, sorted by position
    async fn lists_for_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, StoreError>;
    async fn create_list(
        &self,
        board_id: Uuid,
        title: String,
        position: Option<i32>,
    ) -> Result<BoardList, StoreError>;
    /// Renames and/or moves a list inside its board
    async fn update_list(&self, id: Uuid, patch: UpdateListRequest) -> Result<BoardList, StoreError>;
    /// Deletes a list with its cards and closes the gap
    async fn delete_list(&self, id: Uuid) -> Result<BoardList, StoreError>;
    async fn reorder_lists(&self, board_id: Uuid, ids: &[Uuid]) -> Result<Vec<BoardList>, StoreError>;

    async fn get_card(&self, id: Uuid) -> Result<Option<Card>, StoreError>;
    /// Cards of a list, sorted by position
    async fn cards_for_list(&self, list_id: Uuid) -> Result<Vec<Card>, StoreError>;
    /// Cards of every list on a board, sorted by list then position
    async fn cards_for_board(&self, board_id: Uuid) -> Result<Vec<Card>, StoreError>;
    async fn create_card(
        &self,
        list_id: Uuid,
        card: NewCard,
        position: Option<i32>,
    ) -> Result<Card, StoreError>;
    /// Edits fields and/or moves a card inside its list
    async fn update_card(&self, id: Uuid, patch: UpdateCardRequest) -> Result<Card, StoreError>;
    async fn delete_card(&self, id: Uuid) -> Result<Card, StoreError>;
    /// Moves a card to `to_list_id` (possibly the same list) at `position`
    async fn move_card(
        &self,
        id: Uuid,
        to_list_id: Uuid,
        position: Option<i32>,
    ) -> Result<Card, StoreError>;
    async fn reorder_cards(&self, list_id: Uuid, ids: &[Uuid]) -> Result<Vec<Card>, StoreError>;

    async fn get_member(&self, board_id: Uuid, user_id: Uuid) -> Result<Option<BoardMember>, StoreError>;
    async fn get_member_by_id(&self, member_id: Uuid) -> Result<Option<BoardMember>, StoreError>;
    async fn members_for_board(&self, board_id: Uuid) -> Result<Vec<BoardMember>, StoreError>;
    /// Fails with `Conflict` when the user is already a member
    async fn add_member(&self, board_id: Uuid, user: &User, role: Role) -> Result<BoardMember, StoreError>;
    async fn update_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, StoreError>;
    async fn remove_member(&self, member_id: Uuid) -> Result<BoardMember, StoreError>;
}
