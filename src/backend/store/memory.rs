/**
 * In-Memory Board Store
 *
 * Keeps every table in a `HashMap` behind a single `tokio::sync::RwLock`.
 * A write operation holds the write guard from its first existence check to
 * its last position write, so concurrent moves and reorders serialize the
 * same way row locks serialize them in PostgreSQL.
 *
 * Used when `DATABASE_URL` is unset or unreachable, and by the test suite.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::store::{BoardStore, NewCard, StoreError};
use crate::shared::api::{UpdateBoardRequest, UpdateCardRequest, UpdateListRequest};
use crate::shared::position::{
    apply_order, close_slot, insert_position, open_slot, reorder_within, sort_by_position,
};
use crate::shared::{Board, BoardList, BoardMember, Card, Role, User};

#[derive(Debug, Clone)]
struct Membership {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    role: Role,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    boards: HashMap<Uuid, Board>,
    lists: HashMap<Uuid, BoardList>,
    cards: HashMap<Uuid, Card>,
    memberships: HashMap<Uuid, Membership>,
}

impl Tables {
    fn lists_of(&mut self, board_id: Uuid) -> Vec<&mut BoardList> {
        self.lists
            .values_mut()
            .filter(|list| list.board_id == board_id)
            .collect()
    }

    fn cards_of(&mut self, list_id: Uuid) -> Vec<&mut Card> {
        self.cards
            .values_mut()
            .filter(|card| card.list_id == list_id)
            .collect()
    }

    fn sorted_lists(&self, board_id: Uuid) -> Vec<BoardList> {
        let mut lists: Vec<BoardList> = self
            .lists
            .values()
            .filter(|list| list.board_id == board_id)
            .cloned()
            .collect();
        sort_by_position(&mut lists);
        lists
    }

    fn sorted_cards(&self, list_id: Uuid) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .filter(|card| card.list_id == list_id)
            .cloned()
            .collect();
        sort_by_position(&mut cards);
        cards
    }

    /// Joins a membership with the user's display fields
    fn member_view(&self, membership: &Membership) -> Option<BoardMember> {
        let user = self.users.get(&membership.user_id)?;
        Some(BoardMember {
            id: membership.id,
            board_id: membership.board_id,
            user_id: membership.user_id,
            role: membership.role,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        })
    }
}

/// Board store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn upsert_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|other| other.id != user.id && other.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(StoreError::Conflict(format!("email {} is already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn boards_for_user(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError> {
        let tables = self.tables.read().await;
        let mut boards: Vec<Board> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| tables.boards.get(&m.board_id).cloned())
            .collect();
        boards.sort_by_key(|board| board.created_at);
        Ok(boards)
    }

    async fn get_board(&self, id: Uuid) -> Result<Option<Board>, StoreError> {
        Ok(self.tables.read().await.boards.get(&id).cloned())
    }

    async fn create_board(
        &self,
        owner: &User,
        title: String,
        bg_color: String,
    ) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            title,
            bg_color,
            owner_id: owner.id,
            created_at: now,
            updated_at: now,
        };
        tables.users.entry(owner.id).or_insert_with(|| owner.clone());
        tables.boards.insert(board.id, board.clone());
        let membership = Membership {
            id: Uuid::new_v4(),
            board_id: board.id,
            user_id: owner.id,
            role: Role::Owner,
        };
        tables.memberships.insert(membership.id, membership);
        Ok(board)
    }

    async fn update_board(&self, id: Uuid, patch: UpdateBoardRequest) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        let board = tables.boards.get_mut(&id).ok_or(StoreError::NotFound("board"))?;
        if let Some(title) = patch.title {
            board.title = title;
        }
        if let Some(bg_color) = patch.bg_color {
            board.bg_color = bg_color;
        }
        board.updated_at = Utc::now();
        Ok(board.clone())
    }

    async fn delete_board(&self, id: Uuid) -> Result<Board, StoreError> {
        let mut tables = self.tables.write().await;
        let board = tables.boards.remove(&id).ok_or(StoreError::NotFound("board"))?;
        let list_ids: Vec<Uuid> = tables
            .lists
            .values()
            .filter(|list| list.board_id == id)
            .map(|list| list.id)
            .collect();
        tables.cards.retain(|_, card| !list_ids.contains(&card.list_id));
        tables.lists.retain(|_, list| list.board_id != id);
        tables.memberships.retain(|_, m| m.board_id != id);
        Ok(board)
    }

    async fn get_list(&self, id: Uuid) -> Result<Option<BoardList>, StoreError> {
        Ok(self.tables.read().await.lists.get(&id).cloned())
    }

    async fn lists_for_board(&self, board_id: Uuid) -> Result<Vec<BoardList>, StoreError> {
        Ok(self.tables.read().await.sorted_lists(board_id))
    }

    async fn create_list(
        &self,
        board_id: Uuid,
        title: String,
        position: Option<i32>,
    ) -> Result<BoardList, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.boards.contains_key(&board_id) {
            return Err(StoreError::NotFound("board"));
        }
        let mut siblings = tables.lists_of(board_id);
        let position = insert_position(&siblings, position)?;
        open_slot(&mut siblings, position);

        let now = Utc::now();
        let list = BoardList {
            id: Uuid::new_v4(),
            board_id,
            title,
            position,
            created_at: now,
            updated_at: now,
        };
        tables.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn update_list(&self, id: Uuid, patch: UpdateListRequest) -> Result<BoardList, StoreError> {
        let mut tables = self.tables.write().await;
        let board_id = tables
            .lists
            .get(&id)
            .map(|list| list.board_id)
            .ok_or(StoreError::NotFound("list"))?;
        if let Some(to) = patch.position {
            let mut siblings = tables.lists_of(board_id);
            reorder_within(&mut siblings, id, to)?;
        }
        let list = tables.lists.get_mut(&id).ok_or(StoreError::NotFound("list"))?;
        if let Some(title) = patch.title {
            list.title = title;
        }
        list.updated_at = Utc::now();
        Ok(list.clone())
    }

    async fn delete_list(&self, id: Uuid) -> Result<BoardList, StoreError> {
        let mut tables = self.tables.write().await;
        let list = tables.lists.remove(&id).ok_or(StoreError::NotFound("list"))?;
        tables.cards.retain(|_, card| card.list_id != id);
        let mut siblings = tables.lists_of(list.board_id);
        close_slot(&mut siblings, list.position);
        Ok(list)
    }

    async fn reorder_lists(&self, board_id: Uuid, ids: &[Uuid]) -> Result<Vec<BoardList>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.boards.contains_key(&board_id) {
            return Err(StoreError::NotFound("board"));
        }
        let mut siblings = tables.lists_of(board_id);
        apply_order(&mut siblings, ids)?;
        Ok(tables.sorted_lists(board_id))
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        Ok(self.tables.read().await.cards.get(&id).cloned())
    }

    async fn cards_for_list(&self, list_id: Uuid) -> Result<Vec<Card>, StoreError> {
        Ok(self.tables.read().await.sorted_cards(list_id))
    }

    async fn cards_for_board(&self, board_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sorted_lists(board_id)
            .iter()
            .flat_map(|list| tables.sorted_cards(list.id))
            .collect())
    }

    async fn create_card(
        &self,
        list_id: Uuid,
        card: NewCard,
        position: Option<i32>,
    ) -> Result<Card, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.lists.contains_key(&list_id) {
            return Err(StoreError::NotFound("list"));
        }
        let mut siblings = tables.cards_of(list_id);
        let position = insert_position(&siblings, position)?;
        open_slot(&mut siblings, position);

        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4(),
            list_id,
            title: card.title,
            description: card.description,
            due_date: card.due_date,
            position,
            created_at: now,
            updated_at: now,
        };
        tables.cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn update_card(&self, id: Uuid, patch: UpdateCardRequest) -> Result<Card, StoreError> {
        let mut tables = self.tables.write().await;
        let list_id = tables
            .cards
            .get(&id)
            .map(|card| card.list_id)
            .ok_or(StoreError::NotFound("card"))?;
        if let Some(to) = patch.position {
            let mut siblings = tables.cards_of(list_id);
            reorder_within(&mut siblings, id, to)?;
        }
        let card = tables.cards.get_mut(&id).ok_or(StoreError::NotFound("card"))?;
        if let Some(title) = patch.title {
            card.title = title;
        }
        if let Some(description) = patch.description {
            card.description = Some(description);
        }
        if let Some(due_date) = patch.due_date {
            card.due_date = Some(due_date);
        }
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn delete_card(&self, id: Uuid) -> Result<Card, StoreError> {
        let mut tables = self.tables.write().await;
        let card = tables.cards.remove(&id).ok_or(StoreError::NotFound("card"))?;
        let mut siblings = tables.cards_of(card.list_id);
        close_slot(&mut siblings, card.position);
        Ok(card)
    }

    async fn move_card(
        &self,
        id: Uuid,
        to_list_id: Uuid,
        position: Option<i32>,
    ) -> Result<Card, StoreError> {
        let mut tables = self.tables.write().await;
        let (from_list_id, from_position) = tables
            .cards
            .get(&id)
            .map(|card| (card.list_id, card.position))
            .ok_or(StoreError::NotFound("card"))?;
        if !tables.lists.contains_key(&to_list_id) {
            return Err(StoreError::NotFound("list"));
        }

        if from_list_id == to_list_id {
            let mut siblings = tables.cards_of(to_list_id);
            reorder_within(&mut siblings, id, position.unwrap_or(i32::MAX))?;
        } else {
            let target = tables.cards_of(to_list_id);
            let position = insert_position(&target, position)?;

            let mut source = tables.cards_of(from_list_id);
            close_slot(&mut source, from_position);
            let mut target = tables.cards_of(to_list_id);
            open_slot(&mut target, position);

            let card = tables.cards.get_mut(&id).ok_or(StoreError::NotFound("card"))?;
            card.list_id = to_list_id;
            card.position = position;
        }

        let card = tables.cards.get_mut(&id).ok_or(StoreError::NotFound("card"))?;
        card.updated_at = Utc::now();
        Ok(card.clone())
    }

    async fn reorder_cards(&self, list_id: Uuid, ids: &[Uuid]) -> Result<Vec<Card>, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.lists.contains_key(&list_id) {
            return Err(StoreError::NotFound("list"));
        }
        let mut siblings = tables.cards_of(list_id);
        apply_order(&mut siblings, ids)?;
        Ok(tables.sorted_cards(list_id))
    }

    async fn get_member(&self, board_id: Uuid, user_id: Uuid) -> Result<Option<BoardMember>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .values()
            .find(|m| m.board_id == board_id && m.user_id == user_id)
            .and_then(|m| tables.member_view(m)))
    }

    async fn get_member_by_id(&self, member_id: Uuid) -> Result<Option<BoardMember>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .get(&member_id)
            .and_then(|m| tables.member_view(m)))
    }

    async fn members_for_board(&self, board_id: Uuid) -> Result<Vec<BoardMember>, StoreError> {
        let tables = self.tables.read().await;
        let mut members: Vec<BoardMember> = tables
            .memberships
            .values()
            .filter(|m| m.board_id == board_id)
            .filter_map(|m| tables.member_view(m))
            .collect();
        members.sort_by(|a, b| b.role.cmp(&a.role).then_with(|| a.name.cmp(&b.name)));
        Ok(members)
    }

    async fn add_member(&self, board_id: Uuid, user: &User, role: Role) -> Result<BoardMember, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.boards.contains_key(&board_id) {
            return Err(StoreError::NotFound("board"));
        }
        let exists = tables
            .memberships
            .values()
            .any(|m| m.board_id == board_id && m.user_id == user.id);
        if exists {
            return Err(StoreError::Conflict("user is already a member of this board".to_string()));
        }
        tables.users.entry(user.id).or_insert_with(|| user.clone());
        let membership = Membership {
            id: Uuid::new_v4(),
            board_id,
            user_id: user.id,
            role,
        };
        let member = tables
            .member_view(&membership)
            .ok_or(StoreError::NotFound("user"))?;
        tables.memberships.insert(membership.id, membership);
        Ok(member)
    }

    async fn update_member_role(&self, member_id: Uuid, role: Role) -> Result<BoardMember, StoreError> {
        let mut tables = self.tables.write().await;
        let membership = tables
            .memberships
            .get_mut(&member_id)
            .ok_or(StoreError::NotFound("member"))?;
        membership.role = role;
        let membership = membership.clone();
        tables
            .member_view(&membership)
            .ok_or(StoreError::NotFound("user"))
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<BoardMember, StoreError> {
        let mut tables = self.tables.write().await;
        let membership = tables
            .memberships
            .get(&member_id)
            .cloned()
            .ok_or(StoreError::NotFound("member"))?;
        let member = tables.member_view(&membership);
        tables.memberships.remove(&member_id);
        member.ok_or(StoreError::NotFound("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::position::{is_dense, PositionError};
    use assert_matches::assert_matches;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            avatar_url: None,
        }
    }

    async fn board_with_lists(store: &MemoryStore, n: usize) -> (Board, Vec<BoardList>) {
        let owner = user("Owner");
        store.upsert_user(owner.clone()).await.unwrap();
        let board = store
            .create_board(&owner, "Roadmap".to_string(), "#0079bf".to_string())
            .await
            .unwrap();
        let mut lists = Vec::new();
        for i in 0..n {
            lists.push(
                store
                    .create_list(board.id, format!("List {}", i), None)
                    .await
                    .unwrap(),
            );
        }
        (board, lists)
    }

    async fn fill(store: &MemoryStore, list_id: Uuid, n: usize) -> Vec<Card> {
        let mut cards = Vec::new();
        for i in 0..n {
            let new = NewCard {
                title: format!("Card {}", i),
                ..NewCard::default()
            };
            cards.push(store.create_card(list_id, new, None).await.unwrap());
        }
        cards
    }

    #[tokio::test]
    async fn test_create_board_adds_owner_member() {
        let store = MemoryStore::new();
        let (board, _) = board_with_lists(&store, 0).await;
        let members = store.members_for_board(board.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, Role::Owner);
        assert_eq!(members[0].user_id, board.owner_id);
    }

    #[tokio::test]
    async fn test_insert_list_in_the_middle_shifts_tail() {
        let store = MemoryStore::new();
        let (board, lists) = board_with_lists(&store, 3).await;
        let inserted = store
            .create_list(board.id, "Inserted".to_string(), Some(1))
            .await
            .unwrap();
        let after = store.lists_for_board(board.id).await.unwrap();
        assert!(is_dense(&after));
        let ids: Vec<Uuid> = after.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![lists[0].id, inserted.id, lists[1].id, lists[2].id]);
    }

    #[tokio::test]
    async fn test_delete_list_closes_gap_and_drops_cards() {
        let store = MemoryStore::new();
        let (board, lists) = board_with_lists(&store, 3).await;
        fill(&store, lists[1].id, 2).await;
        store.delete_list(lists[1].id).await.unwrap();
        let after = store.lists_for_board(board.id).await.unwrap();
        assert_eq!(after.len(), 2);
        assert!(is_dense(&after));
        assert!(store.cards_for_list(lists[1].id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_card_across_lists_keeps_both_dense() {
        let store = MemoryStore::new();
        let (_, lists) = board_with_lists(&store, 2).await;
        let source = fill(&store, lists[0].id, 3).await;
        fill(&store, lists[1].id, 2).await;

        let moved = store
            .move_card(source[1].id, lists[1].id, Some(0))
            .await
            .unwrap();
        assert_eq!(moved.list_id, lists[1].id);
        assert_eq!(moved.position, 0);

        let from = store.cards_for_list(lists[0].id).await.unwrap();
        let to = store.cards_for_list(lists[1].id).await.unwrap();
        assert_eq!(from.len(), 2);
        assert_eq!(to.len(), 3);
        assert!(is_dense(&from));
        assert!(is_dense(&to));
        assert_eq!(to[0].id, source[1].id);
    }

    #[tokio::test]
    async fn test_move_card_within_list_without_position_goes_last() {
        let store = MemoryStore::new();
        let (_, lists) = board_with_lists(&store, 1).await;
        let cards = fill(&store, lists[0].id, 3).await;
        let moved = store.move_card(cards[0].id, lists[0].id, None).await.unwrap();
        assert_eq!(moved.position, 2);
        assert!(is_dense(&store.cards_for_list(lists[0].id).await.unwrap()));
    }

    #[tokio::test]
    async fn test_reorder_cards_rejects_stale_ids_without_writing() {
        let store = MemoryStore::new();
        let (_, lists) = board_with_lists(&store, 1).await;
        let cards = fill(&store, lists[0].id, 3).await;
        let before = store.cards_for_list(lists[0].id).await.unwrap();

        let stale = vec![cards[2].id, cards[1].id, Uuid::new_v4()];
        assert_matches!(
            store.reorder_cards(lists[0].id, &stale).await,
            Err(StoreError::Position(PositionError::UnknownEntity(_)))
        );
        assert_eq!(store.cards_for_list(lists[0].id).await.unwrap(), before);

        let ok = vec![cards[2].id, cards[0].id, cards[1].id];
        let after = store.reorder_cards(lists[0].id, &ok).await.unwrap();
        assert_eq!(after.iter().map(|c| c.id).collect::<Vec<_>>(), ok);
    }

    #[tokio::test]
    async fn test_add_member_twice_conflicts() {
        let store = MemoryStore::new();
        let (board, _) = board_with_lists(&store, 0).await;
        let guest = store.upsert_user(user("Guest")).await.unwrap();
        store.add_member(board.id, &guest, Role::Viewer).await.unwrap();
        assert_matches!(
            store.add_member(board.id, &guest, Role::Editor).await,
            Err(StoreError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn test_delete_board_cascades() {
        let store = MemoryStore::new();
        let (board, lists) = board_with_lists(&store, 2).await;
        let cards = fill(&store, lists[0].id, 1).await;
        store.delete_board(board.id).await.unwrap();
        assert!(store.get_list(lists[0].id).await.unwrap().is_none());
        assert!(store.get_card(cards[0].id).await.unwrap().is_none());
        assert!(store.members_for_board(board.id).await.unwrap().is_empty());
    }
}
