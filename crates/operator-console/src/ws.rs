use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use overlay_session::SessionSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Ping,
    Pong,
    Session { data: SessionSnapshot },
    Error { message: String },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the initial snapshot so a change published
    // in between is not missed.
    let mut events = state.session.subscribe();
    let initial = state.session.snapshot().await;

    // Push the current state immediately, then every published change.
    let send_task = tokio::spawn(async move {
        if !send_snapshot(&mut sender, initial).await {
            return;
        }
        loop {
            match events.recv().await {
                Ok(snapshot) => {
                    if !send_snapshot(&mut sender, snapshot).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket receiver lagged; resuming with next snapshot");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Handle incoming messages
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(WsMessage::Ping) = serde_json::from_str::<WsMessage>(&text) {
                        debug!("websocket ping");
                    }
                }
                Message::Close(_) => {
                    debug!("websocket client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}

async fn send_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    snapshot: SessionSnapshot,
) -> bool {
    match serde_json::to_string(&WsMessage::Session { data: snapshot }) {
        Ok(json) => sender.send(Message::Text(json)).await.is_ok(),
        Err(err) => {
            warn!(error = %err, "failed to encode session snapshot");
            true
        }
    }
}
