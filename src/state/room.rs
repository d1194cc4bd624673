use super::{GameError, GameResult};
use crate::config::GameConfig;
use crate::protocol::{ParticipantInfo, ServerMessage};
use crate::types::*;
use serde::Serialize;
use std::collections::HashMap;

/// One game session.
///
/// Invariants: at most one open question; `answers` keys are always
/// participants; `round <= total_rounds` while playing.
#[derive(Debug)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: UserId,
    pub status: RoomStatus,
    pub round: u32,
    pub total_rounds: u32,
    pub scoring: ScoringConfig,
    participants: HashMap<UserId, Participant>,
    /// Roster order: join order until the first reveal, standings after
    order: Vec<UserId>,
    question: Option<Question>,
    deadline: Option<i64>,
    answers: HashMap<UserId, Answer>,
    /// Set once the store has dropped this room
    closed: bool,
}

/// Read-only view for the HTTP API
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub round: u32,
    pub total_rounds: u32,
    pub participants: usize,
}

impl Room {
    pub fn new(code: RoomCode, host_id: UserId, config: &GameConfig) -> Self {
        Self {
            code,
            host_id,
            status: RoomStatus::Lobby,
            round: 0,
            total_rounds: config.total_rounds,
            scoring: config.scoring,
            participants: HashMap::new(),
            order: Vec::new(),
            question: None,
            deadline: None,
            answers: HashMap::new(),
            closed: false,
        }
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.get(user_id)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(super) fn close(&mut self) {
        self.closed = true;
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    pub fn answer(&self, user_id: &str) -> Option<&Answer> {
        self.answers.get(user_id)
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// True if `connection_id` is the live connection of `user_id` here
    pub fn is_current_connection(&self, user_id: &str, connection_id: &str) -> bool {
        self.participants
            .get(user_id)
            .is_some_and(|p| p.connection.id == connection_id)
    }

    /// Insert a participant, or refresh an existing one without touching its score.
    ///
    /// Returns the connection the user was previously bound to, if it differs.
    pub fn upsert_participant(
        &mut self,
        user_id: &str,
        name: String,
        avatar_url: Option<String>,
        connection: ConnectionHandle,
    ) -> Option<ConnectionId> {
        if let Some(existing) = self.participants.get_mut(user_id) {
            existing.name = name;
            existing.avatar_url = avatar_url;
            let previous = std::mem::replace(&mut existing.connection, connection);
            return (previous.id != existing.connection.id).then_some(previous.id);
        }

        self.participants.insert(
            user_id.to_string(),
            Participant {
                user_id: user_id.to_string(),
                name,
                avatar_url,
                connection,
                score: 0,
            },
        );
        self.order.push(user_id.to_string());
        None
    }

    /// Remove a participant along with any answer they gave this round
    pub fn remove_participant(&mut self, user_id: &str) -> Option<Participant> {
        let removed = self.participants.remove(user_id)?;
        self.order.retain(|id| id != user_id);
        self.answers.remove(user_id);
        Some(removed)
    }

    /// Participants in roster order
    pub fn roster(&self) -> Vec<ParticipantInfo> {
        self.order
            .iter()
            .filter_map(|id| self.participants.get(id))
            .map(ParticipantInfo::from)
            .collect()
    }

    /// Re-sort the roster by descending score and return it.
    ///
    /// The sort is stable, so equal scores keep their previous relative order.
    pub fn rank(&mut self) -> Vec<ParticipantInfo> {
        let participants = &self.participants;
        self.order.sort_by_key(|id| {
            std::cmp::Reverse(participants.get(id).map(|p| p.score).unwrap_or(0))
        });
        self.roster()
    }

    pub fn room_update(&self) -> ServerMessage {
        ServerMessage::RoomUpdate {
            code: self.code.clone(),
            participants: self.roster(),
            status: self.status,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            status: self.status,
            round: self.round,
            total_rounds: self.total_rounds,
            participants: self.participants.len(),
        }
    }

    /// Send a message to every participant's connection
    pub fn broadcast(&self, msg: ServerMessage) {
        for id in &self.order {
            if let Some(p) = self.participants.get(id) {
                if !p.connection.send(msg.clone()) {
                    tracing::debug!("Connection {} of {} is gone", p.connection.id, id);
                }
            }
        }
    }

    /// Open a new question, dropping the previous round's answers
    pub fn open_question(&mut self, question: Question, deadline: i64) {
        self.answers.clear();
        self.question = Some(question);
        self.deadline = Some(deadline);
    }

    /// Close the open question, handing back what is needed to score it
    pub fn take_question(&mut self) -> Option<(Question, i64, HashMap<UserId, Answer>)> {
        let question = self.question.take()?;
        let deadline = self.deadline.take()?;
        Some((question, deadline, std::mem::take(&mut self.answers)))
    }

    /// Accept an answer if every precondition holds; otherwise say which failed
    pub fn accept_answer(
        &mut self,
        user_id: &str,
        connection_id: &str,
        question_id: &str,
        answer: Answer,
    ) -> GameResult<()> {
        let question = self
            .question
            .as_ref()
            .ok_or(GameError::Precondition("no open question"))?;
        if question.id != question_id {
            return Err(GameError::Precondition("answer for a superseded question"));
        }
        match self.deadline {
            Some(deadline) if answer.received_at <= deadline => {}
            _ => return Err(GameError::Precondition("answer after deadline")),
        }
        if !self.is_current_connection(user_id, connection_id) {
            return Err(GameError::Precondition("connection does not speak for a participant"));
        }
        if self.answers.contains_key(user_id) {
            return Err(GameError::Precondition("already answered"));
        }

        self.answers.insert(user_id.to_string(), answer);
        Ok(())
    }

    /// Add points to a participant, returning the new total
    pub fn award(&mut self, user_id: &str, points: u32) -> Option<u32> {
        let participant = self.participants.get_mut(user_id)?;
        participant.score = participant.score.saturating_add(points);
        Some(participant.score)
    }

    /// User ids in roster order
    pub fn order(&self) -> &[UserId] {
        &self.order
    }
}
