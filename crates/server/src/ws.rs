//! WebSocket push channel
//!
//! Every connection receives every refresh broadcast; there is no
//! per-subscriber filtering and nothing is sent on connect.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tokenagg_core::TokenRecord;

use crate::conversions::PushMessage;
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // subscribe before the upgrade so no update between handshake and socket task is lost
    let updates = state.refresh.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, updates))
}

async fn handle_socket(socket: WebSocket, updates: broadcast::Receiver<TokenRecord>) {
    let id = Uuid::new_v4();
    info!("Client connected: {}", id);

    let (mut sender, mut receiver) = socket.split();
    let mut updates = BroadcastStream::new(updates);

    loop {
        tokio::select! {
            update = updates.next() => match update {
                Some(Ok(record)) => {
                    let frame = match serde_json::to_string(&PushMessage::price_update(&record)) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!("Failed to encode update for {}: {}", record.token_address, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    debug!("Client {} lagged, skipped {} updates", id, skipped);
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    info!("Client disconnected: {}", id);
}
