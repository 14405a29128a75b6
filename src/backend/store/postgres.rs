/**
 * PostgreSQL Board Store
 *
 * Every position-changing operation runs in one transaction:
 * 1. Lock the affected container rows with `SELECT ... FOR UPDATE`
 * 2. Re-read the entity under the lock
 * 3. Compute the shifts with `shared::position`
 * 4. Write the changed positions and the entity row
 * 5. Commit
 *
 * Locks are always taken board row first, then list rows in id order, then
 * card rows. A list's board never changes, but a card's list does, so card
 * writes re-check `list_id` after locking and retry if the card moved.
 *
 * Any error before commit drops the transaction, which rolls back every
 * position write of the operation.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::backend::store::{BoardStore, NewCard, StoreError};
use crate::shared::api::{UpdateBoardRequest, UpdateCardRequest, UpdateListRequest};
use crate::shared::position::{
    apply_order, close_slot, insert_position, open_slot, reorder_within, PositionChange,
};
use crate::shared::{Board, BoardList, BoardMember, Card, Role, User};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    avatar_url: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: Uuid,
    title: String,
    bg_color: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: row.id,
            title: row.title,
            bg_color: row.bg_color,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    board_id: Uuid,
    title: String,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for BoardList {
    fn from(row: ListRow) -> Self {
        BoardList {
            id: row.id,
            board_id: row.board_id,
            title: row.title,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    list_id: Uuid,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Card {
            id: row.id,
            list_id: row.list_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    role: String,
    name: String,
    email: String,
    avatar_url: Option<String>,
}

impl TryFrom<MemberRow> for BoardMember {
    type Error = StoreError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.to_string().into())))?;
        Ok(BoardMember {
            id: row.id,
            board_id: row.board_id,
            user_id: row.user_id,
            role,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
        })
    }
}

const LIST_COLUMNS: &str = "id, board_id, title, position, created_at, updated_at";
const CARD_COLUMNS: &str =
    "id, list_id, title, description, due_date, position, created_at, updated_at";
const MEMBER_SELECT: &str = r#"
    SELECT m.id, m.board_id, m.user_id, m.role, u.name, u.email, u.avatar_url
    FROM board_members m
    JOIN users u ON u.id = m.user_id
"#;

/// Board store backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Opens a transaction holding the card's list row (and `target`'s)
    async fn begin_with_card(
        &self,
        id: Uuid,
        target: Option<Uuid>,
    ) -> Result<(Transaction<'static, Postgres>, Card), StoreError> {
        for _ in 0..CARD_LOCK_ATTEMPTS {
            let mut tx = self.pool.begin().await?;
            if let Some(card) = lock_card(&mut tx, id, target).await? {
                return Ok((tx, card));
            }
            tracing::debug!(card_id = %id, "[Board] Card moved while locking, retrying");
        }
        Err(StoreError::Conflict("card is being moved by someone else".into()))
    }
}

const CARD_LOCK_ATTEMPTS: usize = 3;

async fn lock_board_row(conn: &mut PgConnection, board_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM boards WHERE id = $1 FOR UPDATE")
        .bind(board_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("board"))?;
    Ok(())
}

async fn lock_list_row(conn: &mut PgConnection, list_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM lists WHERE id = $1 FOR UPDATE")
        .bind(list_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("list"))?;
    Ok(())
}

/// Locks a list's board row, then reads the list under that lock
async fn lock_list(conn: &mut PgConnection, id: Uuid) -> Result<BoardList, StoreError> {
    let board_id: Uuid = sqlx::query_scalar("SELECT board_id FROM lists WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("list"))?;
    lock_board_row(conn, board_id).await?;
    fetch_list(conn, id).await
}

/// Locks the list rows a card write touches, then re-reads the card
///
/// With a `target` list the target's board row is locked first. Returns
/// `None` when the card left its list before the lock was held.
async fn lock_card(
    conn: &mut PgConnection,
    id: Uuid,
    target: Option<Uuid>,
) -> Result<Option<Card>, StoreError> {
    let list_id: Uuid = sqlx::query_scalar("SELECT list_id FROM cards WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("card"))?;

    let mut rows = vec![list_id];
    if let Some(target) = target {
        let board_id: Uuid = sqlx::query_scalar("SELECT board_id FROM lists WHERE id = $1")
            .bind(target)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(StoreError::NotFound("list"))?;
        lock_board_row(conn, board_id).await?;
        if target != list_id {
            rows.push(target);
        }
    }
    rows.sort();
    for row in rows {
        lock_list_row(conn, row).await?;
    }

    let card = sqlx::query_as::<_, CardRow>(&format!(
        "SELECT {} FROM cards WHERE id = $1 FOR UPDATE",
        CARD_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound("card"))?;
    let card = Card::from(card);
    Ok((card.list_id == list_id).then_some(card))
}

/// Locks and loads the lists of a board
async fn lock_lists(conn: &mut PgConnection, board_id: Uuid) -> Result<Vec<BoardList>, StoreError> {
    let rows = sqlx::query_as::<_, ListRow>(&format!(
        "SELECT {} FROM lists WHERE board_id = $1 ORDER BY position FOR UPDATE",
        LIST_COLUMNS
    ))
    .bind(board_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Locks and loads the cards of a list
async fn lock_cards(conn: &mut PgConnection, list_id: Uuid) -> Result<Vec<Card>, StoreError> {
    let rows = sqlx::query_as::<_, CardRow>(&format!(
        "SELECT {} FROM cards WHERE list_id = $1 ORDER BY position FOR UPDATE",
        CARD_COLUMNS
    ))
    .bind(list_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

async fn write_list_positions(
    conn: &mut PgConnection,
    changes: &[PositionChange],
) -> Result<(), StoreError> {
    for change in changes {
        sqlx::query("UPDATE lists SET position = $2 WHERE id = $1")
            .bind(change.id)
            .bind(change.position)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_card_positions(
    conn: &mut PgConnection,
    changes: &[PositionChange],
) -> Result<(), StoreError> {
    for change in changes {
        sqlx::query("UPDATE cards SET position = $2 WHERE id = $1")
            .bind(change.id)
            .bind(change.position)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn fetch_card(conn: &mut PgConnection, id: Uuid) -> Result<Card, StoreError> {
    let row = sqlx::query_as::<_, CardRow>(&format!("SELECT {} FROM cards WHERE id = $1", CARD_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("card"))?;
    Ok(row.into())
}

async fn fetch_list(conn: &mut PgConnection, id: Uuid) -> Result<BoardList, StoreError> {
    let row = sqlx::query_as::<_, ListRow>(&format!(
        "SELECT {} FROM lists WHERE id = $1 FOR UPDATE",
        LIST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound("list"))?;
    Ok(row.into())
}

fn unique_violation(err: sqlx::Error, message: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message.into()),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl BoardStore for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, name, email, avatar_url FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, avatar_url FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn upsert_user(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, avatar_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                avatar_url = EXCLUDED.avatar_url
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, format!("email {} is already registered", user.email)))?;
        Ok(user)
    }

    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError> {
        let rows = sqlx::query_as::<_, BoardRow>(
            r#"
            SELECT b.id, b.title, b.bg_color, b.owner_id, b.created_at, b.updated_at
            FROM boards b
            JOIN board_members m ON m.board_id = b.id
            WHERE m.user_id = $1
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_board(&self, id: Uuid) -> Result<Option<Board>, StoreError> {
        let row = sqlx::query_as::<_, BoardRow>(
            "SELECT id, title, bg_color, owner_id, created_at, updated_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create_board(
        &self,
        owner: &User,
        title: String,
        bg_color: String,
    ) -> Result<Board, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, BoardRow>(
            r#"
            INSERT INTO boards (id, title, bg_color, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, title, bg_color, owner_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&title)
        .bind(&bg_color)
        .bind(owner.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO board_members (id, board_id, user_id, role) VALUES ($1, $2, $3, $4)")
            .bind(Uuid::new_v4())
            .bind(row.id)
            .bind(owner.id)
            .bind(Role::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_board(&self, id: Uuid, patch: UpdateBoardRequest) -> Result<Board, StoreError> {
        let row = sqlx::query_as::<_, BoardRow>(
            r#"
            UPDATE boards SET
                title = COALESCE($2, title),
                bg_color = COALESCE($3, bg_color),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, bg_color, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.bg_color)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("board"))?;
        Ok(row.into())
    }

    async fn delete_board(&self, id: Uuid) -> Result<Board, StoreError> {
        let row = sqlx::query_as::<_, BoardRow>(
            "DELETE FROM boards WHERE id = $1 RETURNING id, title, bg_color, owner_id, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("board"))?;
        Ok(row.into())
    }

    async fn get_list(&self, id: Uuid) -> Result<Option<BoardList>, StoreError> {
        let row = sqlx::query_as::<_, ListRow>(&format!("SELECT {} FROM lists WHERE id = $1", LIST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn lists_for_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, StoreError> {
        let rows = sqlx::query_as::<_, ListRow>(&format!(
            "SELECT {} FROM lists WHERE board_id = $1 ORDER BY position",
            LIST_COLUMNS
        ))
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_list(
        &self,
        board_id: Uuid,
        title: String,
        position: Option<i32>,
    ) -> Result<BoardList, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_board_row(&mut tx, board_id).await?;

        let mut siblings = lock_lists(&mut tx, board_id).await?;
        let position = insert_position(&siblings, position)?;
        let changes = open_slot(&mut siblings, position);
        write_list_positions(&mut tx, &changes).await?;

        let row = sqlx::query_as::<_, ListRow>(&format!(
            "INSERT INTO lists (id, board_id, title, position, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {}",
            LIST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(board_id)
        .bind(&title)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_list(&self, id: Uuid, patch: UpdateListRequest) -> Result<BoardList, StoreError> {
        let mut tx = self.pool.begin().await?;
        let list = lock_list(&mut tx, id).await?;
        if let Some(to) = patch.position {
            let mut siblings = lock_lists(&mut tx, list.board_id).await?;
            let changes = reorder_within(&mut siblings, id, to)?;
            write_list_positions(&mut tx, &changes).await?;
        }
        let row = sqlx::query_as::<_, ListRow>(&format!(
            "UPDATE lists SET title = COALESCE($2, title), updated_at = NOW() WHERE id = $1 RETURNING {}",
            LIST_COLUMNS
        ))
        .bind(id)
        .bind(patch.title)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_list(&self, id: Uuid) -> Result<BoardList, StoreError> {
        let mut tx = self.pool.begin().await?;
        let list = lock_list(&mut tx, id).await?;
        let mut siblings = lock_lists(&mut tx, list.board_id).await?;
        sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        siblings.retain(|sibling| sibling.id != id);
        let changes = close_slot(&mut siblings, list.position);
        write_list_positions(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(list)
    }

    async fn reorder_lists(&self, board_id: Uuid, ids: &[Uuid]) -> Result<Vec<BoardList>, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_board_row(&mut tx, board_id).await?;
        let mut siblings = lock_lists(&mut tx, board_id).await?;
        let changes = apply_order(&mut siblings, ids)?;
        write_list_positions(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(siblings)
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(&format!("SELECT {} FROM cards WHERE id = $1", CARD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn cards_for_list(&self, list_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let rows = sqlx::query_as::<_, CardRow>(&format!(
            "SELECT {} FROM cards WHERE list_id = $1 ORDER BY position",
            CARD_COLUMNS
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn cards_for_board(&self, board_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT c.id, c.list_id, c.title, c.description, c.due_date, c.position,
                   c.created_at, c.updated_at
            FROM cards c
            JOIN lists l ON l.id = c.list_id
            WHERE l.board_id = $1
            ORDER BY l.position, c.position
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_card(
        &self,
        list_id: Uuid,
        card: NewCard,
        position: Option<i32>,
    ) -> Result<Card, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_list_row(&mut tx, list_id).await?;

        let mut siblings = lock_cards(&mut tx, list_id).await?;
        let position = insert_position(&siblings, position)?;
        let changes = open_slot(&mut siblings, position);
        write_card_positions(&mut tx, &changes).await?;

        let row = sqlx::query_as::<_, CardRow>(&format!(
            "INSERT INTO cards (id, list_id, title, description, due_date, position, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {}",
            CARD_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(list_id)
        .bind(&card.title)
        .bind(&card.description)
        .bind(card.due_date)
        .bind(position)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_card(&self, id: Uuid, patch: UpdateCardRequest) -> Result<Card, StoreError> {
        let (mut tx, card) = self.begin_with_card(id, None).await?;
        if let Some(to) = patch.position {
            let mut siblings = lock_cards(&mut tx, card.list_id).await?;
            let changes = reorder_within(&mut siblings, id, to)?;
            write_card_positions(&mut tx, &changes).await?;
        }
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "UPDATE cards SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                due_date = COALESCE($4, due_date), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            CARD_COLUMNS
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.due_date)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    async fn delete_card(&self, id: Uuid) -> Result<Card, StoreError> {
        let (mut tx, card) = self.begin_with_card(id, None).await?;
        let mut siblings = lock_cards(&mut tx, card.list_id).await?;
        sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        siblings.retain(|sibling| sibling.id != id);
        let changes = close_slot(&mut siblings, card.position);
        write_card_positions(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(card)
    }

    async fn move_card(
        &self,
        id: Uuid,
        to_list_id: Uuid,
        position: Option<i32>,
    ) -> Result<Card, StoreError> {
        let (mut tx, card) = self.begin_with_card(id, Some(to_list_id)).await?;

        if card.list_id == to_list_id {
            let mut siblings = lock_cards(&mut tx, to_list_id).await?;
            let changes = reorder_within(&mut siblings, id, position.unwrap_or(i32::MAX))?;
            write_card_positions(&mut tx, &changes).await?;
        } else {
            let mut source = lock_cards(&mut tx, card.list_id).await?;
            let mut target = lock_cards(&mut tx, to_list_id).await?;

            let position = insert_position(&target, position)?;
            source.retain(|sibling| sibling.id != id);
            let closed = close_slot(&mut source, card.position);
            let opened = open_slot(&mut target, position);
            write_card_positions(&mut tx, &closed).await?;
            write_card_positions(&mut tx, &opened).await?;

            sqlx::query("UPDATE cards SET list_id = $2, position = $3 WHERE id = $1")
                .bind(id)
                .bind(to_list_id)
                .bind(position)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE cards SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let moved = fetch_card(&mut tx, id).await?;
        tx.commit().await?;
        Ok(moved)
    }

    async fn reorder_cards(&self, list_id: Uuid, ids: &[Uuid]) -> Result<Vec<Card>, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_list_row(&mut tx, list_id).await?;
        let mut siblings = lock_cards(&mut tx, list_id).await?;
        let changes = apply_order(&mut siblings, ids)?;
        write_card_positions(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(siblings)
    }

    async fn get_member(&self, board_id: Uuid, user_id: Uuid) -> Result<Option<BoardMember>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "{} WHERE m.board_id = $1 AND m.user_id = $2",
            MEMBER_SELECT
        ))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(BoardMember::try_from).transpose()
    }

    async fn get_member_by_id(&self, member_id: Uuid) -> Result<Option<BoardMember>, StoreError> {
        let row = sqlx::query_as::<_, MemberRow>(&format!("{} WHERE m.id = $1", MEMBER_SELECT))
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(BoardMember::try_from).transpose()
    }

    async fn members_for_board(&self, board_id: Uuid) -> Result<Vec<BoardMember>, StoreError> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "{} WHERE m.board_id = $1 ORDER BY u.name",
            MEMBER_SELECT
        ))
        .bind(board_id)
        .fetch_all(&self.pool)
        .await?;
        let mut members = rows
            .into_iter()
            .map(BoardMember::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        members.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.name.cmp(&b.name)));
        Ok(members)
    }

    async fn add_member(&self, board_id: Uuid, user: &User, role: Role) -> Result<BoardMember, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_board_row(&mut tx, board_id).await?;

        let member_id = Uuid::new_v4();
        sqlx::query("INSERT INTO board_members (id, board_id, user_id, role) VALUES ($1, $2, $3, $4)")
            .bind(member_id)
            .bind(board_id)
            .bind(user.id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| unique_violation(e, "user is already a member of this board"))?;

        let row = sqlx::query_as::<_, MemberRow>(&format!("{} WHERE m.id = $1", MEMBER_SELECT))
            .bind(member_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        BoardMember::try_from(row)
    }

    async fn update_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, StoreError> {
        let updated = sqlx::query("UPDATE board_members SET role = $2 WHERE id = $1")
            .bind(member_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("member"));
        }
        self.get_member_by_id(member_id)
            .await?
            .ok_or(StoreError::NotFound("member"))
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<BoardMember, StoreError> {
        let member = self
            .get_member_by_id(member_id)
            .await?
            .ok_or(StoreError::NotFound("member"))?;
        sqlx::query("DELETE FROM board_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(member)
    }
}
