//! Property-based tests for position arithmetic

use proptest::prelude::*;
use taskboard::shared::position::{
    apply_order, close_slot, insert_position, is_dense, open_slot, reorder_within, sort_by_position,
    Positioned,
};
use uuid::Uuid;

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

#[derive(Debug, Clone)]
enum Op {
    Insert(Option<u8>),
    Remove(u8),
    Move(u8, u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::option::of(any::<u8>()).prop_map(Op::Insert),
        any::<u8>().prop_map(Op::Remove),
        (any::<u8>(), any::<u8>()).prop_map(|(a, b)| Op::Move(a, b)),
    ]
}

fn apply(items: &mut Vec<Slot>, op: Op) {
    match op {
        Op::Insert(requested) => {
            let at = insert_position(items, requested.map(i32::from)).unwrap();
            open_slot(items, at);
            items.push(Slot {
                id: Uuid::new_v4(),
                position: at,
            });
        }
        Op::Remove(index) if !items.is_empty() => {
            let removed = items.remove(index as usize % items.len());
            close_slot(items, removed.position);
        }
        Op::Move(index, to) if !items.is_empty() => {
            let id = items[index as usize % items.len()].id;
            reorder_within(items, id, i32::from(to)).unwrap();
        }
        _ => {}
    }
}

fn slots(n: usize) -> Vec<Slot> {
    (0..n)
        .map(|i| Slot {
            id: Uuid::new_v4(),
            position: i as i32,
        })
        .collect()
}

proptest! {
    #[test]
    fn test_any_operation_sequence_stays_dense(ops in proptest::collection::vec(op(), 1..40)) {
        let mut items = Vec::new();
        for op in ops {
            apply(&mut items, op);
            prop_assert!(is_dense(&items), "not dense: {:?}", items);
        }
    }

    #[test]
    fn test_permutation_sets_positions_to_index(
        n in 1usize..12,
        seed in proptest::collection::vec(any::<u32>(), 12),
    ) {
        let mut items = slots(n);
        let mut ids: Vec<Uuid> = items.iter().map(|s| s.id).collect();
        ids.sort_by_key(|id| seed[ids_index(&items, *id) % seed.len()]);

        apply_order(&mut items, &ids).unwrap();
        sort_by_position(&mut items);
        let ordered: Vec<Uuid> = items.iter().map(|s| s.id).collect();
        prop_assert_eq!(ordered, ids);
        prop_assert!(is_dense(&items));
    }

    #[test]
    fn test_incomplete_ordering_changes_nothing(n in 2usize..12, drop in any::<usize>()) {
        let mut items = slots(n);
        let before = items.clone();
        let mut ids: Vec<Uuid> = items.iter().map(|s| s.id).collect();
        ids.remove(drop % n);

        prop_assert!(apply_order(&mut items, &ids).is_err());
        prop_assert_eq!(items, before);
    }
}

fn ids_index(items: &[Slot], id: Uuid) -> usize {
    items.iter().position(|s| s.id == id).unwrap_or(0)
}
