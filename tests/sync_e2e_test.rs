//! End-to-end sync: a real server, the HTTP client and the realtime client

#![cfg(all(feature = "ssr", feature = "client"))]

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::{test_config, TestBoard};
use taskboard::backend::auth::create_token;
use taskboard::backend::server::create_app_with_store;
use taskboard::client::{pump_events, BoardApi, HttpBoardApi, OptimisticBoard, RealtimeClient};
use taskboard::shared::api::CreateCardRequest;
use taskboard::shared::{AppConfig, ServerEvent, User};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn serve(tb: &TestBoard) -> AppConfig {
    let (router, _state) = create_app_with_store(tb.store.clone(), test_config());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    AppConfig::builder()
        .server_url(format!("http://{}", addr))
        .build()
        .unwrap()
}

fn token(user: &User) -> String {
    create_token(&test_config(), user).unwrap()
}

async fn next_event(events: &mut UnboundedReceiver<ServerEvent>) -> ServerEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_card_created_over_http_reaches_another_client() {
    let tb = TestBoard::new().await;
    let config = serve(&tb).await;

    let editor_api = std::sync::Arc::new(HttpBoardApi::new(config.clone(), token(&tb.editor)));
    let editor_board = OptimisticBoard::new(editor_api, tb.board.id);
    editor_board.load().await.unwrap();

    let (realtime, mut events) = RealtimeClient::connect(&config, &token(&tb.editor)).await.unwrap();
    realtime.join_board(tb.board.id).unwrap();
    assert_matches!(next_event(&mut events).await, ServerEvent::UsersActive { users, .. } if users.len() == 1);

    let pump_board = editor_board.clone();
    let pump = tokio::spawn(async move { pump_events(events, &pump_board).await });

    let owner_api = HttpBoardApi::new(config.clone(), token(&tb.owner));
    let card = owner_api
        .create_card(
            tb.todo.id,
            CreateCardRequest {
                title: "From the owner".into(),
                description: None,
                due_date: None,
                position: None,
            },
        )
        .await
        .unwrap();

    let seen = timeout(WAIT, async {
        loop {
            if editor_board.cache().await.cards_in(tb.todo.id).contains(&card) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(seen.is_ok(), "broadcast never reached the editor's cache");

    realtime.close().await;
    pump.abort();
}

#[tokio::test]
async fn test_socket_join_is_denied_for_strangers() {
    let tb = TestBoard::new().await;
    let stranger = common::create_user(tb.store.as_ref(), "Stranger").await;
    let config = serve(&tb).await;

    let (realtime, mut events) = RealtimeClient::connect(&config, &token(&stranger)).await.unwrap();
    realtime.join_board(tb.board.id).unwrap();

    assert_eq!(
        next_event(&mut events).await,
        ServerEvent::error("Access denied to this board")
    );
    realtime.close().await;
}

#[tokio::test]
async fn test_socket_without_token_is_refused() {
    let tb = TestBoard::new().await;
    let config = serve(&tb).await;
    assert!(RealtimeClient::connect(&config, "").await.is_err());
}
