//! WebSocket message dispatch
//!
//! Entry point for validated client events. Each event is routed to the
//! engine; the return value is an optional reply for the sending connection
//! only. Everything room-wide goes out through the room broadcast.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, GameResult};
use crate::types::ConnectionHandle;
use std::sync::Arc;

/// Turn an engine outcome into the targeted reply, if any
fn reply(event: &str, result: GameResult<()>) -> Option<ServerMessage> {
    match result {
        Ok(()) => None,
        Err(e) if e.is_reported() => {
            tracing::warn!("{} failed: {}", event, e);
            Some(ServerMessage::Error {
                message: e.to_string(),
            })
        }
        Err(e) => {
            tracing::debug!("{} dropped: {}", event, e);
            None
        }
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    conn: &ConnectionHandle,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            room_code,
            user_id,
            name,
            avatar_url,
            is_host,
        } => {
            let result = state
                .join(conn, &room_code, &user_id, &name, avatar_url, is_host)
                .await;
            reply("room:join", result)
        }

        ClientMessage::Leave { room_code, user_id } => {
            reply("room:leave", state.leave(&conn.id, &room_code, &user_id).await)
        }

        ClientMessage::StartGame { room_code } => {
            reply("game:start", state.start_game(&room_code).await)
        }

        ClientMessage::SelectGenre {
            room_code,
            genre_id,
        } => reply(
            "question:select_genre",
            state.select_genre(&room_code, &genre_id).await,
        ),

        ClientMessage::SubmitAnswer {
            room_code,
            question_id,
            option_index,
            time_ms,
        } => {
            let result = state
                .submit_answer(
                    &conn.id,
                    &room_code,
                    &question_id,
                    usize::from(option_index),
                    time_ms,
                )
                .await;
            reply("answer:submit", result)
        }

        ClientMessage::Reveal {} => reply("answer:reveal", state.reveal(&conn.id).await),
    }
}
