/**
 * WebSocket Endpoint
 *
 * `GET /ws` authenticates the client *before* upgrading. A rejected
 * handshake answers with HTTP 401 and a JSON reason, and no connection or
 * room state is ever created for it.
 *
 * After the upgrade each socket runs two halves:
 * - a sender task that drains the connection's hub queue into the sink
 * - the receiver loop on the current task, feeding text frames to its
 *   `Connection`
 *
 * Whichever way the socket ends (close frame, read error, dropped TCP, or
 * the hub evicting a connection whose queue filled up), the receiver loop
 * exits and cleanup runs exactly once.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::{authenticate, extract_token};
use crate::backend::error::BackendError;
use crate::backend::realtime::lifecycle::Connection;
use crate::backend::realtime::registry::ConnectionIdentity;
use crate::backend::server::state::AppState;
use crate::shared::User;

/// Query string of the upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// Handle the WebSocket upgrade (GET /ws)
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Response {
    let token = extract_token(
        query.token.as_deref(),
        &headers,
        &state.config.access_cookie_name,
    );

    let user = match authenticate(state.store.as_ref(), &state.config.jwt_secret, token).await {
        Ok(user) => user,
        Err(err) => {
            tracing::info!(reason = %err, "[Realtime] Handshake rejected");
            return BackendError::from(err).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let socket_id = Uuid::new_v4();
    tracing::info!(%socket_id, user_id = %user.id, "[Realtime] WebSocket connected");

    let mut rx = state.hub.add(socket_id, user.id);
    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(%socket_id, error = %e, "[Realtime] Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                tracing::debug!(%socket_id, "[Realtime] WebSocket sink closed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut connection = Connection::new(
        ConnectionIdentity::new(socket_id, &user),
        state.store.clone(),
        state.registry.clone(),
        state.broadcaster.clone(),
    );

    loop {
        let result = tokio::select! {
            _ = &mut send_task => {
                tracing::debug!(%socket_id, "[Realtime] Sender task ended");
                break;
            }
            frame = stream.next() => match frame {
                Some(result) => result,
                None => break,
            },
        };
        match result {
            Ok(Message::Text(text)) => connection.handle_text(text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                state
                    .broadcaster
                    .send_error(socket_id, "Binary frames are not supported");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%socket_id, error = %e, "[Realtime] WebSocket receive error");
                break;
            }
        }
    }

    connection.disconnect();
    state.hub.remove(socket_id);
    send_task.abort();
    tracing::info!(%socket_id, "[Realtime] WebSocket disconnected");
}
