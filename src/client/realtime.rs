//! # Realtime Client
//!
//! WebSocket connection to the board server. Outgoing commands go through an
//! unbounded queue drained by a writer task; inbound frames are decoded into
//! `ServerEvent`s by a reader task and handed out on an mpsc channel.
//! [`pump_events`] drains that channel into an [`OptimisticBoard`].

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use crate::client::api::{BoardApi, ClientError};
use crate::client::optimistic::OptimisticBoard;
use crate::client::reconciliation::ReconciliationResult;
use crate::shared::{AppConfig, ClientMessage, ServerEvent};

/// Live socket to the board server
pub struct RealtimeClient {
    outgoing: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RealtimeClient {
    /// Connects with `?token=` and starts the reader and writer tasks
    ///
    /// The returned receiver yields every decoded event until the socket
    /// closes.
    pub async fn connect(
        config: &AppConfig,
        token: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>), ClientError> {
        config.validate()?;
        let url = format!("{}?token={}", config.ws_url, token);

        let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            ClientError::Realtime(format!("Failed to connect to {}: {e}", config.ws_url))
        })?;
        tracing::info!(url = %config.ws_url, "[Realtime] Connected");

        let (mut sink, mut source) = stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    tracing::warn!(error = %e, "[Realtime] Send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "[Realtime] Undecodable event");
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("[Realtime] Server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "[Realtime] Connection error");
                        break;
                    }
                }
            }
        });

        Ok((
            Self {
                outgoing,
                reader,
                writer,
            },
            events_rx,
        ))
    }

    pub fn join_board(&self, board_id: Uuid) -> Result<(), ClientError> {
        self.send(ClientMessage::JoinBoard { board_id })
    }

    pub fn leave_board(&self, board_id: Uuid) -> Result<(), ClientError> {
        self.send(ClientMessage::LeaveBoard { board_id })
    }

    fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        let json = message
            .to_json()
            .map_err(|e| ClientError::Realtime(e.to_string()))?;
        self.outgoing
            .send(Message::Text(json))
            .map_err(|_| ClientError::Realtime("connection closed".into()))
    }

    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished() && !self.writer.is_finished()
    }

    /// Sends a close frame and waits for the writer to flush it
    pub async fn close(mut self) {
        let _ = self.outgoing.send(Message::Close(None));
        let _ = (&mut self.writer).await;
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Applies events to `board` until the channel closes
///
/// Returns how many events changed the cache.
pub async fn pump_events<A: BoardApi>(
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    board: &OptimisticBoard<A>,
) -> usize {
    let mut applied = 0;
    while let Some(event) = events.recv().await {
        match board.apply_event(&event).await {
            ReconciliationResult::Applied => applied += 1,
            ReconciliationResult::BoardGone => {
                applied += 1;
                let board_id = board.board_id().await;
                tracing::info!(board_id = %board_id, "[Realtime] Board was deleted");
            }
            ReconciliationResult::Unchanged | ReconciliationResult::Ignored => {}
        }
    }
    applied
}
