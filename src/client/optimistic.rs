//! # Optimistic Board
//!
//! Applies every user mutation to the local `BoardCache` immediately, sends
//! it through a `BoardApi`, and then either reconciles the response or rolls
//! the change back.
//!
//! The cache lock is never held across a network await, so broadcasts keep
//! flowing in while a request is in flight. Rollback restores the snapshots
//! taken at apply time. The board is re-fetched afterwards when the failure
//! is a `NotFound`, or when broadcasts changed the cache while the request was
//! in flight, since the restored snapshot no longer reflects them.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::client::api::{BoardApi, ClientError};
use crate::client::cache::{CacheEntity, CollectionCache, Snapshot};
use crate::client::reconciliation::{BoardCache, ReconciliationResult};
use crate::shared::api::{
    CreateCardRequest, CreateListRequest, MoveCardRequest, UpdateCardRequest, UpdateListRequest,
};
use crate::shared::{BoardList, Card, ServerEvent};

/// One board's cache wired to the API
pub struct OptimisticBoard<A: BoardApi> {
    api: Arc<A>,
    state: Arc<RwLock<BoardCache>>,
}

impl<A: BoardApi> Clone for OptimisticBoard<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: BoardApi> OptimisticBoard<A> {
    pub fn new(api: Arc<A>, board_id: Uuid) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(BoardCache::new(board_id))),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Read access for rendering
    pub async fn cache(&self) -> RwLockReadGuard<'_, BoardCache> {
        self.state.read().await
    }

    pub async fn board_id(&self) -> Uuid {
        self.state.read().await.board_id()
    }

    /// Fetches the canonical board and replaces the cache with it
    pub async fn load(&self) -> Result<(), ClientError> {
        let board_id = self.board_id().await;
        let details = self.api.board_details(board_id).await?;
        self.state.write().await.load(details);
        tracing::debug!(%board_id, "[Sync] Board loaded");
        Ok(())
    }

    /// Folds a broadcast into the cache
    pub async fn apply_event(&self, event: &ServerEvent) -> ReconciliationResult {
        let result = self.state.write().await.apply_event(event);
        tracing::trace!(event = event.name(), ?result, "[Sync] Event reconciled");
        result
    }

    pub async fn create_list(&self, request: CreateListRequest) -> Result<BoardList, ClientError> {
        let now = Utc::now();
        let token = {
            let mut cache = self.state.write().await;
            let board_id = cache.board_id();
            cache.lists.insert_pending(BoardList {
                id: Uuid::nil(),
                board_id,
                title: request.title.clone(),
                position: 0,
                created_at: now,
                updated_at: now,
            })
        };

        let board_id = self.board_id().await;
        match self.api.create_list(board_id, request).await {
            Ok(list) => {
                let mut cache = self.state.write().await;
                cache.lists.confirm_pending(token, list.clone());
                if !cache.cards.is_loaded(list.id) {
                    cache.cards.replace_collection(list.id, Vec::new());
                }
                Ok(list)
            }
            Err(e) => {
                self.state.write().await.lists.discard_pending(token);
                Err(self.recover(e, false).await)
            }
        }
    }

    pub async fn update_list(&self, list_id: Uuid, request: UpdateListRequest) -> Result<BoardList, ClientError> {
        let (snapshot, revision) = {
            let mut cache = self.state.write().await;
            let board_id = cache.board_id();
            let mut list = cache
                .lists
                .get(list_id)
                .cloned()
                .ok_or(ClientError::NotCached("list"))?;
            let snapshot = cache.lists.snapshot(board_id);
            if let Some(title) = &request.title {
                list.title = title.clone();
            }
            if let Some(position) = request.position {
                list.position = position;
            }
            cache.lists.place(list);
            (snapshot, cache.revision())
        };

        match self.api.update_list(list_id, request).await {
            Ok(list) => {
                self.state.write().await.lists.place(list.clone());
                Ok(list)
            }
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.lists.restore(snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    pub async fn delete_list(&self, list_id: Uuid) -> Result<BoardList, ClientError> {
        let (lists_snapshot, cards_snapshot, revision) = {
            let mut cache = self.state.write().await;
            let board_id = cache.board_id();
            let lists_snapshot = cache.lists.snapshot(board_id);
            let cards_snapshot = cache.cards.snapshot(list_id);
            cache.lists.remove(list_id);
            cache.cards.forget(list_id);
            (lists_snapshot, cards_snapshot, cache.revision())
        };

        match self.api.delete_list(list_id).await {
            Ok(list) => Ok(list),
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.lists.restore(lists_snapshot);
                    cache.cards.restore(cards_snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    pub async fn reorder_lists(&self, ids: Vec<Uuid>) -> Result<Vec<BoardList>, ClientError> {
        let board_id = self.board_id().await;
        let (snapshot, revision) = {
            let mut cache = self.state.write().await;
            let snapshot = reorder_locally(&mut cache.lists, board_id, &ids)?;
            (snapshot, cache.revision())
        };

        match self.api.reorder_lists(board_id, ids).await {
            Ok(lists) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.lists.replace_collection(board_id, lists.clone());
                    cache.revision() != revision
                };
                if raced {
                    self.resync().await;
                }
                Ok(lists)
            }
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.lists.restore(snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    pub async fn create_card(&self, list_id: Uuid, request: CreateCardRequest) -> Result<Card, ClientError> {
        let now = Utc::now();
        let token = self.state.write().await.cards.insert_pending(Card {
            id: Uuid::nil(),
            list_id,
            title: request.title.clone(),
            description: request.description.clone(),
            due_date: request.due_date,
            position: 0,
            created_at: now,
            updated_at: now,
        });

        match self.api.create_card(list_id, request).await {
            Ok(card) => {
                self.state.write().await.cards.confirm_pending(token, card.clone());
                Ok(card)
            }
            Err(e) => {
                self.state.write().await.cards.discard_pending(token);
                Err(self.recover(e, false).await)
            }
        }
    }

    pub async fn update_card(&self, card_id: Uuid, request: UpdateCardRequest) -> Result<Card, ClientError> {
        let (snapshot, revision) = {
            let mut cache = self.state.write().await;
            let mut card = cache
                .cards
                .get(card_id)
                .cloned()
                .ok_or(ClientError::NotCached("card"))?;
            let snapshot = cache.cards.snapshot(card.list_id);
            if let Some(title) = &request.title {
                card.title = title.clone();
            }
            if let Some(description) = &request.description {
                card.description = Some(description.clone());
            }
            if let Some(due_date) = request.due_date {
                card.due_date = Some(due_date);
            }
            if let Some(position) = request.position {
                card.position = position;
            }
            cache.cards.place(card);
            (snapshot, cache.revision())
        };

        match self.api.update_card(card_id, request).await {
            Ok(card) => {
                self.state.write().await.cards.place(card.clone());
                Ok(card)
            }
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.cards.restore(snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    pub async fn delete_card(&self, card_id: Uuid) -> Result<Card, ClientError> {
        let (snapshot, revision) = {
            let mut cache = self.state.write().await;
            let list_id = cache
                .cards
                .get(card_id)
                .map(|c| c.list_id)
                .ok_or(ClientError::NotCached("card"))?;
            let snapshot = cache.cards.snapshot(list_id);
            cache.cards.remove(card_id);
            (snapshot, cache.revision())
        };

        match self.api.delete_card(card_id).await {
            Ok(card) => Ok(card),
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.cards.restore(snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    /// Moves a card to `to_list_id`, appending when `position` is `None`
    pub async fn move_card(
        &self,
        card_id: Uuid,
        to_list_id: Uuid,
        position: Option<i32>,
    ) -> Result<Card, ClientError> {
        let (from_snapshot, to_snapshot, revision) = {
            let mut cache = self.state.write().await;
            let from_list_id = cache
                .cards
                .get(card_id)
                .map(|c| c.list_id)
                .ok_or(ClientError::NotCached("card"))?;
            let from_snapshot = cache.cards.snapshot(from_list_id);
            let to_snapshot = cache.cards.snapshot(to_list_id);
            cache.cards.move_entity(card_id, to_list_id, position);
            (from_snapshot, to_snapshot, cache.revision())
        };

        let request = MoveCardRequest { to_list_id, position };
        match self.api.move_card(card_id, request).await {
            Ok(moved) => {
                self.state.write().await.cards.place(moved.card.clone());
                Ok(moved.card)
            }
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.cards.restore(to_snapshot);
                    cache.cards.restore(from_snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    pub async fn reorder_cards(&self, list_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<Card>, ClientError> {
        let (snapshot, revision) = {
            let mut cache = self.state.write().await;
            let snapshot = reorder_locally(&mut cache.cards, list_id, &ids)?;
            (snapshot, cache.revision())
        };

        match self.api.reorder_cards(list_id, ids).await {
            Ok(cards) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.cards.replace_collection(list_id, cards.clone());
                    cache.revision() != revision
                };
                if raced {
                    self.resync().await;
                }
                Ok(cards)
            }
            Err(e) => {
                let raced = {
                    let mut cache = self.state.write().await;
                    cache.cards.restore(snapshot);
                    cache.revision() != revision
                };
                Err(self.recover(e, raced).await)
            }
        }
    }

    /// Re-fetches the board after a rollback when the restored view is stale
    async fn recover(&self, error: ClientError, raced: bool) -> ClientError {
        if error.requires_resync() || raced {
            tracing::info!(error = %error, raced, "[Sync] Stale view, re-syncing board");
            self.resync().await;
        } else {
            tracing::debug!(error = %error, "[Sync] Rolled back");
        }
        error
    }

    /// Reloads the board; a failed reload is logged, not surfaced
    async fn resync(&self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "[Sync] Re-sync failed");
        }
    }
}

/// Applies a reorder locally, returning the snapshot to roll back to
fn reorder_locally<T: CacheEntity>(
    cache: &mut CollectionCache<T>,
    parent_id: Uuid,
    ids: &[Uuid],
) -> Result<Snapshot<T>, ClientError> {
    let snapshot = cache.snapshot(parent_id);
    if let Err(e) = cache.reorder(parent_id, ids) {
        cache.restore(snapshot);
        return Err(e.into());
    }
    Ok(snapshot)
}
