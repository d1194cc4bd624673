pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::ConnectionHandle;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Parse, rate-limit and validate one inbound text frame.
///
/// Returns None for anything that must be dropped without a reply.
async fn accept_frame(text: &str, conn: &ConnectionHandle, state: &AppState) -> Option<ClientMessage> {
    if let Some(limiter) = &state.rate_limiter {
        if !limiter.check(&conn.id).await {
            tracing::warn!("Rate limited connection {}", conn.id);
            return None;
        }
    }

    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!("Dropping unparseable frame from {}: {}", conn.id, e);
            return None;
        }
    };

    if let Err(e) = msg.validate(state.config.room_code_length) {
        tracing::debug!("Dropping invalid frame from {}: {}", conn.id, e);
        return None;
    }
    Some(msg)
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize {:?}: {}", msg, e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (conn, mut outbound) = ConnectionHandle::new();

    tracing::info!("WebSocket connected: {}", conn.id);

    loop {
        tokio::select! {
            // Room broadcasts addressed to this connection
            Some(msg) = outbound.recv() => {
                if !send_json(&mut sender, &msg).await {
                    break;
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message from {}: {}", conn.id, text.as_str());

                        let Some(client_msg) = accept_frame(text.as_str(), &conn, &state).await else {
                            continue;
                        };
                        if let Some(response) = handlers::handle_message(client_msg, &conn, &state).await {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed: {}", conn.id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error on {}: {}", conn.id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.disconnect(&conn.id).await;
    if let Some(limiter) = &state.rate_limiter {
        limiter.remove(&conn.id).await;
    }
    tracing::info!("WebSocket connection closed: {}", conn.id);
}
