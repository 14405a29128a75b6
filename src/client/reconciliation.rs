//! # Broadcast Reconciliation
//!
//! `BoardCache` is the client's view of one board: the board itself, its
//! lists and cards as `CollectionCache`s, the member list and the presence
//! snapshot. `apply_event` folds one inbound `ServerEvent` into it.
//!
//! Every event is applied by id and position, never by "what I did last",
//! so a client's own echo, a duplicate delivery or a broadcast arriving
//! before the matching HTTP response all converge on the same state.

use uuid::Uuid;

use crate::client::cache::CollectionCache;
use crate::shared::{ActiveUser, Board, BoardDetails, BoardList, BoardMember, Card, ServerEvent};

/// What applying an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// The cache changed
    Applied,
    /// The event was already reflected
    Unchanged,
    /// The event concerns another board or something not loaded
    Ignored,
    /// The board was deleted; the cache is now empty
    BoardGone,
}

/// Client-side state of one board
#[derive(Debug, Clone)]
pub struct BoardCache {
    board_id: Uuid,
    pub board: Option<Board>,
    pub lists: CollectionCache<BoardList>,
    pub cards: CollectionCache<Card>,
    pub members: Vec<BoardMember>,
    pub active_users: Vec<ActiveUser>,
    revision: u64,
}

impl BoardCache {
    pub fn new(board_id: Uuid) -> Self {
        Self {
            board_id,
            board: None,
            lists: CollectionCache::new(),
            cards: CollectionCache::new(),
            members: Vec::new(),
            active_users: Vec::new(),
            revision: 0,
        }
    }

    pub fn board_id(&self) -> Uuid {
        self.board_id
    }

    /// Bumped by every load and every event that changed the cache
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces everything with a canonical snapshot
    pub fn load(&mut self, details: BoardDetails) {
        let BoardDetails {
            board,
            lists,
            cards,
            members,
        } = details;

        self.cards = CollectionCache::new();
        for list in &lists {
            let in_list = cards.iter().filter(|c| c.list_id == list.id).cloned().collect();
            self.cards.replace_collection(list.id, in_list);
        }
        self.lists = CollectionCache::new();
        self.lists.replace_collection(board.id, lists);
        self.members = members;
        self.board_id = board.id;
        self.board = Some(board);
        self.revision += 1;
    }

    pub fn lists(&self) -> Vec<BoardList> {
        self.lists.items(self.board_id)
    }

    pub fn cards_in(&self, list_id: Uuid) -> Vec<Card> {
        self.cards.items(list_id)
    }

    /// Whether an event names a list of this board
    fn owns_list(&self, list_id: Uuid) -> bool {
        self.lists.get(list_id).is_some() || self.cards.is_loaded(list_id)
    }

    pub fn apply_event(&mut self, event: &ServerEvent) -> ReconciliationResult {
        let revision = self.revision;
        let result = self.reconcile(event);
        self.revision = match result {
            ReconciliationResult::Applied | ReconciliationResult::BoardGone => revision + 1,
            ReconciliationResult::Unchanged | ReconciliationResult::Ignored => revision,
        };
        result
    }

    fn reconcile(&mut self, event: &ServerEvent) -> ReconciliationResult {
        use ReconciliationResult::*;

        match event {
            ServerEvent::BoardUpdated { board, .. } => {
                if board.id != self.board_id {
                    return Ignored;
                }
                if self.board.as_ref() == Some(board) {
                    return Unchanged;
                }
                self.board = Some(board.clone());
                Applied
            }
            ServerEvent::BoardDeleted { board_id, .. } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                *self = BoardCache::new(self.board_id);
                BoardGone
            }
            ServerEvent::ListCreated { list, .. } => {
                if list.board_id != self.board_id {
                    return Ignored;
                }
                let created = self.lists.merge_created(list.clone());
                if created && !self.cards.is_loaded(list.id) {
                    self.cards.replace_collection(list.id, Vec::new());
                }
                if created {
                    Applied
                } else {
                    Unchanged
                }
            }
            ServerEvent::ListUpdated { list, .. } => {
                if list.board_id != self.board_id {
                    return Ignored;
                }
                if self.lists.get(list.id) == Some(list) {
                    return Unchanged;
                }
                self.lists.place(list.clone());
                Applied
            }
            ServerEvent::ListReordered { board_id, lists, .. } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                if self.lists() == *lists {
                    return Unchanged;
                }
                self.lists.replace_collection(*board_id, lists.clone());
                Applied
            }
            ServerEvent::ListDeleted { list_id, board_id, .. } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                let removed = self.lists.remove(*list_id).is_some();
                let forgotten = self.cards.forget(*list_id);
                if removed || forgotten {
                    Applied
                } else {
                    Unchanged
                }
            }
            ServerEvent::CardCreated { card, .. } => {
                if !self.owns_list(card.list_id) {
                    return Ignored;
                }
                if self.cards.merge_created(card.clone()) {
                    Applied
                } else {
                    Unchanged
                }
            }
            ServerEvent::CardUpdated { card, .. } => {
                if !self.owns_list(card.list_id) {
                    return Ignored;
                }
                if self.cards.get(card.id) == Some(card) {
                    return Unchanged;
                }
                if self.cards.place(card.clone()) {
                    Applied
                } else {
                    Ignored
                }
            }
            ServerEvent::CardDeleted { card_id, board_id, .. } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                match self.cards.remove(*card_id) {
                    Some(_) => Applied,
                    None => Unchanged,
                }
            }
            ServerEvent::CardMoved { card, .. } => {
                if !self.owns_list(card.list_id) {
                    return Ignored;
                }
                if self.cards.get(card.id) == Some(card) {
                    return Unchanged;
                }
                self.cards.place(card.clone());
                Applied
            }
            ServerEvent::CardReordered { list_id, cards, .. } => {
                if !self.owns_list(*list_id) {
                    return Ignored;
                }
                if self.cards_in(*list_id) == *cards {
                    return Unchanged;
                }
                self.cards.replace_collection(*list_id, cards.clone());
                Applied
            }
            ServerEvent::MemberAdded { member, .. } | ServerEvent::MemberUpdated { member, .. } => {
                if member.board_id != self.board_id {
                    return Ignored;
                }
                match self.members.iter_mut().find(|m| m.id == member.id) {
                    Some(existing) if existing == member => Unchanged,
                    Some(existing) => {
                        *existing = member.clone();
                        Applied
                    }
                    None => {
                        self.members.push(member.clone());
                        Applied
                    }
                }
            }
            ServerEvent::MemberRemoved { board_id, member_id, .. } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                let before = self.members.len();
                self.members.retain(|m| m.id != *member_id);
                if self.members.len() == before {
                    Unchanged
                } else {
                    Applied
                }
            }
            ServerEvent::UsersActive { board_id, users } => {
                if *board_id != self.board_id {
                    return Ignored;
                }
                if self.active_users == *users {
                    return Unchanged;
                }
                self.active_users = users.clone();
                Applied
            }
            ServerEvent::Error { message } => {
                tracing::warn!(%message, "[Sync] Server reported an error");
                Ignored
            }
        }
    }
}
