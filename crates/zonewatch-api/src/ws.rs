//! Live update channel.
//!
//! `GET /ws` upgrades to a WebSocket, sends an `initial_state` message, then
//! forwards fan-out messages as they are published. The broadcast channel
//! already decouples producers from consumers; a subscriber that falls too
//! far behind loses the oldest messages and keeps going.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use zonewatch_models::UpdateMessage;

use crate::state::AppState;

/// WebSocket endpoint for live occupancy updates.
pub async fn live_updates(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.sink.subscribe();
    info!("live-update subscriber attached");

    // Every new subscriber starts from the current occupancy snapshot.
    let initial = UpdateMessage::initial_state(&state.tracker.snapshot().await);
    if send_message(&mut sender, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(message) => {
                        if send_message(&mut sender, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // Slow client: drop the backlog, keep the stream.
                        warn!(missed, "live-update subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("live-update subscriber closed");
                        break;
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
    info!("live-update subscriber detached");
}

async fn send_message(
    sender: &mut (impl SinkExt<Message> + Unpin),
    message: &UpdateMessage,
) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(_) => return Ok(()),
    };
    sender.send(Message::Text(json)).await.map_err(|_| ())
}
