// ABOUTME: Broadcast channel for task activity
// ABOUTME: Every text message is fanned out to all connected subscribers

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::debug;

use crate::state::AppState;

/// Upgrades `/ws/tasks/{client_id}` to a WebSocket and joins the feed.
pub async fn task_feed(
    ws: WebSocketUpgrade,
    Path(client_id): Path<i64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, client_id, state.feed.clone()))
}

async fn handle_socket(socket: WebSocket, client_id: i64, feed: broadcast::Sender<String>) {
    debug!("Client {} joined the task feed", client_id);

    let mut rx = feed.subscribe();
    let (mut sender, mut receiver) = socket.split();

    // Forward broadcasts to this subscriber until the send fails. A lagged
    // receiver just skips ahead; the feed makes no delivery guarantee.
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    if sender.send(Message::Text(message.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Rebroadcast everything this client says, tagged with its id.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let Message::Text(text) = message {
                let _ = feed.send(format!("Client {client_id} says: {text}"));
            }
        }
    });

    // Whichever side finishes first tears the connection down.
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!("Client {} left the task feed", client_id);
}
