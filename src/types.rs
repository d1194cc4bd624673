use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::protocol::ServerMessage;

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type UserId = String;
pub type ConnectionId = String;
pub type QuestionId = String;
pub type GenreId = String;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Lobby,
    Playing,
    Ended,
}

/// Per-room scoring parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub base_points: u32,
    /// Bonus points per granularity unit of time remaining
    pub speed_bonus_multiplier: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_points: 100,
            speed_bonus_multiplier: 2,
        }
    }
}

/// Outbound side of a live connection.
///
/// The socket task owns the receiving half and forwards everything it gets
/// to the client, so sending here is how a room reaches a participant.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id: ulid::Ulid::new().to_string(),
            sender,
        };
        (handle, receiver)
    }

    /// Queue a message for this connection. Returns false if the socket task is gone.
    pub fn send(&self, msg: ServerMessage) -> bool {
        self.sender.send(msg).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub connection: ConnectionHandle,
    /// Cumulative score, only ever increased by a reveal
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    /// Four display strings, in the order the catalog returned them
    pub options: Vec<String>,
    pub correct_index: usize,
    pub media_ref: String,
    pub genre_id: GenreId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answer {
    pub option_index: usize,
    /// Client-reported time it took to answer
    pub elapsed_ms: u64,
    /// Server time the answer was accepted (epoch ms)
    pub received_at: i64,
}

/// Where a connection currently belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_code: RoomCode,
    pub user_id: UserId,
}
