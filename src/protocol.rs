use crate::types::*;
use serde::{Deserialize, Serialize};

/// Number of answer options every question carries
pub const OPTION_COUNT: usize = 4;

/// Events sent by clients. Payload fields sit next to the `event` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "room:join")]
    Join {
        room_code: RoomCode,
        user_id: UserId,
        name: String,
        avatar_url: Option<String>,
        #[serde(default)]
        is_host: bool,
    },
    #[serde(rename = "room:leave")]
    Leave { room_code: RoomCode, user_id: UserId },
    #[serde(rename = "game:start")]
    StartGame { room_code: RoomCode },
    #[serde(rename = "question:select_genre")]
    SelectGenre { room_code: RoomCode, genre_id: GenreId },
    #[serde(rename = "answer:submit")]
    SubmitAnswer {
        room_code: RoomCode,
        question_id: QuestionId,
        option_index: u8,
        time_ms: u64,
    },
    /// Room is inferred from the sender's connection binding
    #[serde(rename = "answer:reveal")]
    Reveal {},
}

/// Schema violations on an inbound event
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("room code must be {expected} characters, got {got}")]
    RoomCodeLength { expected: usize, got: usize },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("avatar must be an http(s) URL")]
    AvatarUrl,

    #[error("option index {0} out of range")]
    OptionIndex(u8),
}

impl ClientMessage {
    /// Check the payload against the event schema.
    ///
    /// A host join may carry an empty room code, since the host has no room yet.
    pub fn validate(&self, code_length: usize) -> Result<(), ValidationError> {
        match self {
            ClientMessage::Join {
                room_code,
                user_id,
                name,
                avatar_url,
                is_host,
            } => {
                if !(*is_host && room_code.is_empty()) {
                    check_room_code(room_code, code_length)?;
                }
                non_empty(user_id, "userId")?;
                non_empty(name, "name")?;
                if let Some(url) = avatar_url {
                    if !is_http_url(url) {
                        return Err(ValidationError::AvatarUrl);
                    }
                }
                Ok(())
            }
            ClientMessage::Leave { room_code, user_id } => {
                check_room_code(room_code, code_length)?;
                non_empty(user_id, "userId")
            }
            ClientMessage::StartGame { room_code } => check_room_code(room_code, code_length),
            ClientMessage::SelectGenre { room_code, genre_id } => {
                check_room_code(room_code, code_length)?;
                non_empty(genre_id, "genreId")
            }
            ClientMessage::SubmitAnswer {
                room_code,
                question_id,
                option_index,
                ..
            } => {
                check_room_code(room_code, code_length)?;
                non_empty(question_id, "questionId")?;
                if usize::from(*option_index) >= OPTION_COUNT {
                    return Err(ValidationError::OptionIndex(*option_index));
                }
                Ok(())
            }
            ClientMessage::Reveal {} => Ok(()),
        }
    }
}

fn check_room_code(code: &str, expected: usize) -> Result<(), ValidationError> {
    let got = code.chars().count();
    if got != expected {
        return Err(ValidationError::RoomCodeLength { expected, got });
    }
    Ok(())
}

fn non_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Events sent by the server, to a whole room unless noted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    #[serde(rename = "room:update")]
    RoomUpdate {
        code: RoomCode,
        participants: Vec<ParticipantInfo>,
        status: RoomStatus,
    },
    #[serde(rename = "game:start")]
    GameStart { round: u32 },
    /// The correct index is deliberately absent
    #[serde(rename = "question:show")]
    QuestionShow {
        id: QuestionId,
        media_ref: String,
        options: Vec<String>,
        deadline_ts: i64,
        round: u32,
        total_rounds: u32,
    },
    /// Who picked what, without correctness
    #[serde(rename = "answer:update")]
    AnswerUpdate { user_id: UserId, option_index: usize },
    #[serde(rename = "answer:reveal")]
    AnswerReveal {
        correct_index: usize,
        updates: Vec<ScoreUpdate>,
        ranking: Vec<ParticipantInfo>,
    },
    #[serde(rename = "game:end")]
    GameEnd { ranking: Vec<ParticipantInfo> },
    /// Sent only to the connection that caused it
    #[serde(rename = "error")]
    Error { message: String },
}

/// Public view of a participant, used for rosters and rankings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub score: u32,
}

impl From<&Participant> for ParticipantInfo {
    fn from(p: &Participant) -> Self {
        Self {
            user_id: p.user_id.clone(),
            name: p.name.clone(),
            avatar_url: p.avatar_url.clone(),
            score: p.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub user_id: UserId,
    pub delta: u32,
    pub total: u32,
}
