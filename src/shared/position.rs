//! Position Arithmetic
//!
//! Lists on a board and cards in a list are ordered by an integer `position`.
//! After any operation settles, the positions of one container form the dense
//! sequence `0..n` with no duplicates and no gaps.
//!
//! Every function here mutates a slice of container members in place and
//! returns the [`PositionChange`]s it made, so a store can persist exactly the
//! rows that moved inside one transaction. Nothing here touches I/O; the same
//! functions drive the in-memory store, the PostgreSQL store and the client
//! cache.
//!
//! # Operations
//!
//! - **Append**: `max + 1`, or `0` for an empty container
//! - **Insert at P**: members at `>= P` shift `+1`, see [`open_slot`]
//! - **Remove from P**: members at `> P` shift `-1`, see [`close_slot`]
//! - **Reorder A → B**: the members between A and B shift towards A, see [`reorder_within`]
//! - **Bulk reorder**: an explicit id order replaces all positions, see [`apply_order`]

use std::collections::HashSet;

use thiserror::Error;
use uuid::Uuid;

/// Anything that lives at an integer position inside a container
pub trait Positioned {
    fn id(&self) -> Uuid;
    fn position(&self) -> i32;
    fn set_position(&mut self, position: i32);
}

impl<T: Positioned> Positioned for &mut T {
    fn id(&self) -> Uuid {
        (**self).id()
    }

    fn position(&self) -> i32 {
        (**self).position()
    }

    fn set_position(&mut self, position: i32) {
        (**self).set_position(position);
    }
}

/// One persisted position write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionChange {
    pub id: Uuid,
    pub position: i32,
}

/// Reasons a position operation is rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("entity {0} is not in this container")]
    UnknownEntity(Uuid),

    #[error("id {0} appears more than once in the ordering")]
    DuplicateId(Uuid),

    #[error("ordering has {got} ids but the container holds {expected}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("position {0} is negative")]
    Negative(i32),
}

/// Position for an appended member: `max + 1`, or `0` when empty
pub fn next_position<T: Positioned>(items: &[T]) -> i32 {
    items
        .iter()
        .map(Positioned::position)
        .max()
        .map_or(0, |max| max + 1)
}

/// Resolves the slot a new or incoming member should take
///
/// `None` appends. An explicit position is clamped to the end of the
/// container so a too-large request can never open a gap.
pub fn insert_position<T: Positioned>(
    items: &[T],
    requested: Option<i32>,
) -> Result<i32, PositionError> {
    let end = next_position(items);
    match requested {
        None => Ok(end),
        Some(p) if p < 0 => Err(PositionError::Negative(p)),
        Some(p) => Ok(p.min(end)),
    }
}

/// Makes room at `at` by shifting every member at or after it by `+1`
pub fn open_slot<T: Positioned>(items: &mut [T], at: i32) -> Vec<PositionChange> {
    let mut changes = Vec::new();
    for item in items.iter_mut().filter(|item| item.position() >= at) {
        let position = item.position() + 1;
        item.set_position(position);
        changes.push(PositionChange { id: item.id(), position });
    }
    changes
}

/// Closes the gap left at `vacated` by shifting every later member by `-1`
pub fn close_slot<T: Positioned>(items: &mut [T], vacated: i32) -> Vec<PositionChange> {
    let mut changes = Vec::new();
    for item in items.iter_mut().filter(|item| item.position() > vacated) {
        let position = item.position() - 1;
        item.set_position(position);
        changes.push(PositionChange { id: item.id(), position });
    }
    changes
}

/// Moves one member to `to` inside the same container
///
/// Moving down (`from < to`) pulls the members in `(from, to]` up by one;
/// moving up (`from > to`) pushes the members in `[to, from)` down by one.
/// `to` is clamped to the last slot.
pub fn reorder_within<T: Positioned>(
    items: &mut [T],
    id: Uuid,
    to: i32,
) -> Result<Vec<PositionChange>, PositionError> {
    if to < 0 {
        return Err(PositionError::Negative(to));
    }
    let from = items
        .iter()
        .find(|item| item.id() == id)
        .map(Positioned::position)
        .ok_or(PositionError::UnknownEntity(id))?;
    let last = next_position(items) - 1;
    let to = to.min(last);
    if from == to {
        return Ok(Vec::new());
    }

    let mut changes = Vec::new();
    for item in items.iter_mut() {
        let p = item.position();
        let shifted = if item.id() == id {
            to
        } else if from < to && p > from && p <= to {
            p - 1
        } else if from > to && p >= to && p < from {
            p + 1
        } else {
            continue;
        };
        item.set_position(shifted);
        changes.push(PositionChange { id: item.id(), position: shifted });
    }
    Ok(changes)
}

/// Replaces every position with the index of its id in `ids`
///
/// `ids` must name exactly the members of the container: same length, no
/// duplicates, no strangers. On error nothing is modified. On success the
/// slice is left sorted in the new order.
pub fn apply_order<T: Positioned>(
    items: &mut [T],
    ids: &[Uuid],
) -> Result<Vec<PositionChange>, PositionError> {
    validate_order(items, ids)?;

    let mut changes = Vec::new();
    for (index, id) in ids.iter().enumerate() {
        let position = index as i32;
        if let Some(item) = items.iter_mut().find(|item| item.id() == *id) {
            if item.position() != position {
                item.set_position(position);
                changes.push(PositionChange { id: *id, position });
            }
        }
    }
    sort_by_position(items);
    Ok(changes)
}

/// Checks that `ids` is a permutation of the container's ids
pub fn validate_order<T: Positioned>(items: &[T], ids: &[Uuid]) -> Result<(), PositionError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(PositionError::DuplicateId(*id));
        }
        if !items.iter().any(|item| item.id() == *id) {
            return Err(PositionError::UnknownEntity(*id));
        }
    }
    if ids.len() != items.len() {
        return Err(PositionError::LengthMismatch {
            expected: items.len(),
            got: ids.len(),
        });
    }
    Ok(())
}

/// Stable sort by position
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(Positioned::position);
}

/// Assigns `position = index` following the current slice order
pub fn renumber<T: Positioned>(items: &mut [T]) -> Vec<PositionChange> {
    let mut changes = Vec::new();
    for (index, item) in items.iter_mut().enumerate() {
        let position = index as i32;
        if item.position() != position {
            item.set_position(position);
            changes.push(PositionChange { id: item.id(), position });
        }
    }
    changes
}

/// Whether the positions are exactly `0..n` in some order
pub fn is_dense<T: Positioned>(items: &[T]) -> bool {
    let mut positions: Vec<i32> = items.iter().map(Positioned::position).collect();
    positions.sort_unstable();
    positions
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Slot {
        id: Uuid,
        position: i32,
    }

    impl Positioned for Slot {
        fn id(&self) -> Uuid {
            self.id
        }

        fn position(&self) -> i32 {
            self.position
        }

        fn set_position(&mut self, position: i32) {
            self.position = position;
        }
    }

    fn container(n: usize) -> Vec<Slot> {
        (0..n)
            .map(|i| Slot { id: Uuid::new_v4(), position: i as i32 })
            .collect()
    }

    fn order(items: &[Slot]) -> Vec<Uuid> {
        let mut sorted = items.to_vec();
        sort_by_position(&mut sorted);
        sorted.into_iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_next_position_empty_and_filled() {
        assert_eq!(next_position::<Slot>(&[]), 0);
        assert_eq!(next_position(&container(3)), 3);
    }

    #[test]
    fn test_insert_position_clamps_to_end() {
        let items = container(2);
        assert_eq!(insert_position(&items, None).unwrap(), 2);
        assert_eq!(insert_position(&items, Some(1)).unwrap(), 1);
        assert_eq!(insert_position(&items, Some(40)).unwrap(), 2);
        assert_eq!(insert_position(&items, Some(-1)), Err(PositionError::Negative(-1)));
    }

    #[test]
    fn test_open_slot_shifts_tail() {
        let mut items = container(3);
        let changes = open_slot(&mut items, 1);
        assert_eq!(changes.len(), 2);
        assert_eq!(items.iter().map(|s| s.position).collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn test_close_slot_after_removal() {
        let mut items = container(4);
        items.remove(1);
        close_slot(&mut items, 1);
        assert!(is_dense(&items));
    }

    #[test]
    fn test_reorder_down() {
        let mut items = container(4);
        let ids = order(&items);
        reorder_within(&mut items, ids[0], 2).unwrap();
        assert_eq!(order(&items), vec![ids[1], ids[2], ids[0], ids[3]]);
        assert!(is_dense(&items));
    }

    #[test]
    fn test_reorder_up() {
        let mut items = container(4);
        let ids = order(&items);
        reorder_within(&mut items, ids[3], 1).unwrap();
        assert_eq!(order(&items), vec![ids[0], ids[3], ids[1], ids[2]]);
        assert!(is_dense(&items));
    }

    #[test]
    fn test_reorder_same_slot_is_noop() {
        let mut items = container(3);
        let ids = order(&items);
        let changes = reorder_within(&mut items, ids[1], 1).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_reorder_unknown_entity() {
        let mut items = container(2);
        let stranger = Uuid::new_v4();
        assert_eq!(
            reorder_within(&mut items, stranger, 0),
            Err(PositionError::UnknownEntity(stranger))
        );
    }

    #[test]
    fn test_apply_order_assigns_indices() {
        let mut items = container(3);
        let ids = order(&items);
        let wanted = vec![ids[2], ids[0], ids[1]];
        apply_order(&mut items, &wanted).unwrap();
        assert_eq!(items.iter().map(|s| s.id).collect::<Vec<_>>(), wanted);
        assert!(is_dense(&items));
    }

    #[test]
    fn test_apply_order_rejects_bad_sets() {
        let mut items = container(3);
        let before = items.clone();
        let ids = order(&items);

        let missing = vec![ids[0], ids[1]];
        assert!(matches!(
            apply_order(&mut items, &missing),
            Err(PositionError::LengthMismatch { expected: 3, got: 2 })
        ));

        let duplicated = vec![ids[0], ids[0], ids[1]];
        assert_eq!(apply_order(&mut items, &duplicated), Err(PositionError::DuplicateId(ids[0])));

        let stranger = Uuid::new_v4();
        let extra = vec![ids[0], ids[1], stranger];
        assert_eq!(apply_order(&mut items, &extra), Err(PositionError::UnknownEntity(stranger)));

        assert_eq!(items, before);
    }

    #[test]
    fn test_renumber_follows_slice_order() {
        let mut items = container(3);
        items.swap(0, 2);
        renumber(&mut items);
        assert_eq!(items.iter().map(|s| s.position).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_is_dense_detects_gaps_and_duplicates() {
        let mut items = container(3);
        assert!(is_dense(&items));
        items[2].position = 5;
        assert!(!is_dense(&items));
        items[2].position = 1;
        assert!(!is_dense(&items));
    }
}
