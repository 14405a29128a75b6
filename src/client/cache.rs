//! # Collection Cache
//!
//! Ordered, per-parent collections of board entities: cards per list and
//! lists per board. Three channels write into it: optimistic applies, direct
//! responses, and inbound broadcasts. Every write is keyed by id (or by
//! pending token) and placed by position, so applying the same change twice,
//! or a response and its broadcast in either order, converges to the same
//! state.
//!
//! Placement mirrors the server's position arithmetic: an entity written at
//! position `p` goes before the first sibling at `p` or later, and the
//! collection is then renumbered `0..n`.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::shared::position::{apply_order, renumber, PositionError, Positioned};
use crate::shared::{BoardList, Card};

/// An entity that lives in an ordered collection under a parent
pub trait CacheEntity: Positioned + Clone {
    fn parent_id(&self) -> Uuid;
    fn set_parent_id(&mut self, parent_id: Uuid);
    fn set_id(&mut self, id: Uuid);
}

impl CacheEntity for Card {
    fn parent_id(&self) -> Uuid {
        self.list_id
    }

    fn set_parent_id(&mut self, parent_id: Uuid) {
        self.list_id = parent_id;
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl CacheEntity for BoardList {
    fn parent_id(&self) -> Uuid {
        self.board_id
    }

    fn set_parent_id(&mut self, parent_id: Uuid) {
        self.board_id = parent_id;
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Client-side handle for an entity the server has not confirmed yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingToken(Uuid);

impl PendingToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PendingToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PendingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// How an entry is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Confirmed(Uuid),
    Pending(PendingToken),
}

/// One slot of a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: EntityKey,
    pub entity: T,
}

impl<T> CacheEntry<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self.key, EntityKey::Pending(_))
    }
}

impl<T: Positioned> Positioned for CacheEntry<T> {
    fn id(&self) -> Uuid {
        self.entity.id()
    }

    fn position(&self) -> i32 {
        self.entity.position()
    }

    fn set_position(&mut self, position: i32) {
        self.entity.set_position(position);
    }
}

/// Saved state of one collection, for rollback
///
/// `None` means the collection was not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    parent_id: Uuid,
    entries: Option<Vec<CacheEntry<T>>>,
}

/// Per-parent ordered collections
#[derive(Debug, Clone)]
pub struct CollectionCache<T> {
    collections: HashMap<Uuid, Vec<CacheEntry<T>>>,
}

impl<T> Default for CollectionCache<T> {
    fn default() -> Self {
        Self {
            collections: HashMap::new(),
        }
    }
}

impl<T: CacheEntity> CollectionCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, parent_id: Uuid) -> bool {
        self.collections.contains_key(&parent_id)
    }

    /// Entities of a parent in display order
    pub fn items(&self, parent_id: Uuid) -> Vec<T> {
        self.collections
            .get(&parent_id)
            .map(|entries| entries.iter().map(|e| e.entity.clone()).collect())
            .unwrap_or_default()
    }

    pub fn entries(&self, parent_id: Uuid) -> &[CacheEntry<T>] {
        self.collections
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Finds a confirmed entity anywhere in the cache
    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.collections
            .values()
            .flat_map(|entries| entries.iter())
            .find(|e| e.key == EntityKey::Confirmed(id))
            .map(|e| &e.entity)
    }

    pub fn pending_count(&self, parent_id: Uuid) -> usize {
        self.entries(parent_id).iter().filter(|e| e.is_pending()).count()
    }

    /// Replaces a whole collection with server state
    pub fn replace_collection(&mut self, parent_id: Uuid, mut items: Vec<T>) {
        items.sort_by_key(|item| item.position());
        let entries = items
            .into_iter()
            .map(|entity| CacheEntry {
                key: EntityKey::Confirmed(entity.id()),
                entity,
            })
            .collect();
        self.collections.insert(parent_id, entries);
    }

    /// Drops a collection, e.g. when its parent was deleted
    pub fn forget(&mut self, parent_id: Uuid) -> bool {
        self.collections.remove(&parent_id).is_some()
    }

    pub fn snapshot(&self, parent_id: Uuid) -> Snapshot<T> {
        Snapshot {
            parent_id,
            entries: self.collections.get(&parent_id).cloned(),
        }
    }

    /// Puts a collection back exactly as it was snapshotted
    pub fn restore(&mut self, snapshot: Snapshot<T>) {
        match snapshot.entries {
            Some(entries) => {
                self.collections.insert(snapshot.parent_id, entries);
            }
            None => {
                self.collections.remove(&snapshot.parent_id);
            }
        }
    }

    /// Appends an unconfirmed entity at the end of its parent
    pub fn insert_pending(&mut self, mut entity: T) -> PendingToken {
        let token = PendingToken::new();
        entity.set_id(token.0);
        let entries = self.collections.entry(entity.parent_id()).or_default();
        entity.set_position(entries.len() as i32);
        entries.push(CacheEntry {
            key: EntityKey::Pending(token),
            entity,
        });
        token
    }

    /// Swaps a pending entry for the server's entity
    ///
    /// If the confirmed id is already cached (its broadcast won the race),
    /// that entry is replaced and the pending one dropped. Returns whether
    /// the pending entry was still there.
    pub fn confirm_pending(&mut self, token: PendingToken, confirmed: T) -> bool {
        let found = self.discard_pending(token);
        self.place(confirmed);
        found
    }

    /// Removes a pending entry after its request failed
    pub fn discard_pending(&mut self, token: PendingToken) -> bool {
        let key = EntityKey::Pending(token);
        for entries in self.collections.values_mut() {
            if let Some(index) = entries.iter().position(|e| e.key == key) {
                entries.remove(index);
                renumber(entries);
                return true;
            }
        }
        false
    }

    /// Applies a `created` broadcast
    ///
    /// No-op if the id is already present. Otherwise the entity is placed at
    /// its position, and leftover pending entries of that parent are
    /// dropped, since their own confirmation will place them again.
    pub fn merge_created(&mut self, entity: T) -> bool {
        let parent_id = entity.parent_id();
        if !self.is_loaded(parent_id) || self.get(entity.id()).is_some() {
            return false;
        }
        if let Some(entries) = self.collections.get_mut(&parent_id) {
            entries.retain(|e| !e.is_pending());
        }
        self.place(entity)
    }

    /// Writes a server entity into its parent at its position
    ///
    /// The entity is first removed from wherever it is cached, so this also
    /// reconciles moves between parents. A parent that is not loaded is left
    /// alone. Returns `false` only when the entity was neither cached nor
    /// placed.
    pub fn place(&mut self, entity: T) -> bool {
        let id = entity.id();
        let parent_id = entity.parent_id();
        let removed = self.remove(id).is_some();
        let Some(entries) = self.collections.get_mut(&parent_id) else {
            return removed;
        };
        let at = entity.position().max(0);
        let index = entries
            .iter()
            .position(|e| e.position() >= at)
            .unwrap_or(entries.len());
        entries.insert(
            index,
            CacheEntry {
                key: EntityKey::Confirmed(id),
                entity,
            },
        );
        renumber(entries);
        true
    }

    /// Removes a confirmed entity and closes the gap it leaves
    pub fn remove(&mut self, id: Uuid) -> Option<T> {
        let key = EntityKey::Confirmed(id);
        for entries in self.collections.values_mut() {
            if let Some(index) = entries.iter().position(|e| e.key == key) {
                let entry = entries.remove(index);
                renumber(entries);
                return Some(entry.entity);
            }
        }
        None
    }

    /// Optimistically moves an entity to `to_parent` at `position`
    ///
    /// `None` appends. Returns `false` if the entity is not cached.
    pub fn move_entity(&mut self, id: Uuid, to_parent: Uuid, position: Option<i32>) -> bool {
        let Some(mut entity) = self.remove(id) else {
            return false;
        };
        let len = self.entries(to_parent).len() as i32;
        entity.set_parent_id(to_parent);
        entity.set_position(position.unwrap_or(len).clamp(0, len));
        self.place(entity);
        true
    }

    /// Re-sorts a collection by a full id order, positions set to index
    ///
    /// Pending entries keep their relative order after the confirmed ones.
    pub fn reorder(&mut self, parent_id: Uuid, ids: &[Uuid]) -> Result<(), PositionError> {
        let Some(entries) = self.collections.get_mut(&parent_id) else {
            return Ok(());
        };
        let (mut confirmed, pending): (Vec<_>, Vec<_>) =
            entries.drain(..).partition(|e| !e.is_pending());
        let outcome = apply_order(&mut confirmed, ids);
        confirmed.extend(pending);
        renumber(&mut confirmed);
        *entries = confirmed;
        outcome.map(|_| ())
    }
}
