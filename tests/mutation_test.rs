//! Mutation integration tests against the in-memory store

#![cfg(feature = "ssr")]

mod common;

use std::collections::HashSet;

use common::TestBoard;
use pretty_assertions::assert_eq;
use taskboard::backend::mutations::{cards, lists};
use taskboard::backend::store::BoardStore;
use taskboard::shared::api::{CreateCardRequest, MoveCardRequest, ReorderRequest, UpdateListRequest};
use taskboard::shared::position::is_dense;
use taskboard::shared::{Card, ErrorKind};
use uuid::Uuid;

async fn seed_cards(tb: &TestBoard, list_id: Uuid, n: usize) -> Vec<Card> {
    let mut created = Vec::new();
    for i in 0..n {
        let card = cards::create_card(
            tb.store.as_ref(),
            &tb.editor,
            list_id,
            CreateCardRequest {
                title: format!("card {}", i),
                description: None,
                due_date: None,
                position: None,
            },
        )
        .await
        .unwrap()
        .entity;
        created.push(card);
    }
    created
}

#[tokio::test]
async fn test_moves_conserve_cards_and_keep_lists_dense() {
    let tb = TestBoard::new().await;
    let seeded = seed_cards(&tb, tb.todo.id, 5).await;

    for (i, card) in seeded.iter().enumerate() {
        let position = if i % 2 == 0 { Some(0) } else { None };
        cards::move_card(
            tb.store.as_ref(),
            &tb.editor,
            card.id,
            MoveCardRequest {
                to_list_id: tb.done.id,
                position,
            },
        )
        .await
        .unwrap();

        let todo = tb.store.cards_for_list(tb.todo.id).await.unwrap();
        let done = tb.store.cards_for_list(tb.done.id).await.unwrap();
        assert!(is_dense(&todo));
        assert!(is_dense(&done));
        assert_eq!(todo.len() + done.len(), seeded.len());
    }

    let ids: HashSet<Uuid> = tb
        .store
        .cards_for_list(tb.done.id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, seeded.iter().map(|c| c.id).collect());
}

#[tokio::test]
async fn test_move_into_another_board_changes_nothing() {
    let tb = TestBoard::new().await;
    let card = seed_cards(&tb, tb.todo.id, 1).await.remove(0);
    let foreign_board = tb
        .store
        .create_board(&tb.editor, "Elsewhere".into(), "#fff".into())
        .await
        .unwrap();
    let foreign_list = tb
        .store
        .create_list(foreign_board.id, "Inbox".into(), None)
        .await
        .unwrap();

    let err = cards::move_card(
        tb.store.as_ref(),
        &tb.editor,
        card.id,
        MoveCardRequest {
            to_list_id: foreign_list.id,
            position: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(tb.store.get_card(card.id).await.unwrap(), Some(card));
    assert!(tb.store.cards_for_list(foreign_list.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_reorders_leave_a_valid_order() {
    let tb = TestBoard::new().await;
    let seeded = seed_cards(&tb, tb.todo.id, 4).await;
    let forward: Vec<Uuid> = seeded.iter().map(|c| c.id).collect();
    let backward: Vec<Uuid> = forward.iter().rev().copied().collect();

    let (a, b) = tokio::join!(
        cards::reorder_cards(tb.store.as_ref(), &tb.editor, tb.todo.id, ReorderRequest { ids: forward.clone() }),
        cards::reorder_cards(tb.store.as_ref(), &tb.owner, tb.todo.id, ReorderRequest { ids: backward.clone() }),
    );
    assert!(a.is_ok());
    assert!(b.is_ok());

    let stored: Vec<Uuid> = tb
        .store
        .cards_for_list(tb.todo.id)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert!(stored == forward || stored == backward);
}

#[tokio::test]
async fn test_reorder_with_missing_ids_is_rejected() {
    let tb = TestBoard::new().await;
    let seeded = seed_cards(&tb, tb.todo.id, 3).await;
    let before = tb.store.cards_for_list(tb.todo.id).await.unwrap();

    let result = cards::reorder_cards(
        tb.store.as_ref(),
        &tb.editor,
        tb.todo.id,
        ReorderRequest {
            ids: vec![seeded[2].id, seeded[0].id],
        },
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(tb.store.cards_for_list(tb.todo.id).await.unwrap(), before);
}

#[tokio::test]
async fn test_moving_a_list_renumbers_its_siblings() {
    let tb = TestBoard::new().await;
    let review = lists::create_list(
        tb.store.as_ref(),
        &tb.editor,
        tb.board.id,
        taskboard::shared::api::CreateListRequest {
            title: "Review".into(),
            position: None,
        },
    )
    .await
    .unwrap()
    .entity;

    lists::update_list(
        tb.store.as_ref(),
        &tb.editor,
        review.id,
        UpdateListRequest {
            title: None,
            position: Some(0),
        },
    )
    .await
    .unwrap();

    let order: Vec<(String, i32)> = tb
        .store
        .lists_for_board(tb.board.id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| (l.title, l.position))
        .collect();
    assert_eq!(
        order,
        vec![
            ("Review".to_string(), 0),
            ("Todo".to_string(), 1),
            ("Done".to_string(), 2)
        ]
    );
}

#[tokio::test]
async fn test_viewer_reads_but_cannot_write() {
    let tb = TestBoard::new().await;
    seed_cards(&tb, tb.todo.id, 2).await;

    let visible = cards::cards_for_list(tb.store.as_ref(), &tb.viewer, tb.todo.id)
        .await
        .unwrap();
    assert_eq!(visible.len(), 2);

    let err = lists::delete_list(tb.store.as_ref(), &tb.viewer, tb.todo.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}
