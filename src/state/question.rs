//! Question lifecycle: select -> show -> collect answers -> reveal -> advance

use super::{AppState, GameError, GameResult};
use crate::catalog::extract_youtube_id;
use crate::protocol::{ScoreUpdate, ServerMessage, OPTION_COUNT};
use crate::types::*;
use rand::Rng;

impl AppState {
    /// Draw a question from `genre_id` and open it for answers.
    ///
    /// The room stays locked while the catalog is queried, so nothing else
    /// can happen in this room until the lookup resolves.
    pub async fn select_genre(&self, room_code: &str, genre_id: &str) -> GameResult<()> {
        let shared = self
            .get_room(room_code)
            .await
            .ok_or(GameError::RoomNotFound)?;
        let mut room = shared.lock().await;

        if room.status != RoomStatus::Playing {
            return Err(GameError::Precondition("game not in progress"));
        }
        if room.question().is_some() {
            return Err(GameError::Precondition("a question is already open"));
        }

        let candidates = self
            .catalog
            .find_candidates(genre_id, OPTION_COUNT)
            .await
            .map_err(|e| {
                tracing::error!("Catalog {} failed for genre {}: {}", self.catalog.name(), genre_id, e);
                GameError::from(e)
            })?;
        if candidates.len() < OPTION_COUNT {
            tracing::warn!(
                "Genre {} has only {} candidates, need {}",
                genre_id,
                candidates.len(),
                OPTION_COUNT
            );
            return Err(GameError::InsufficientContent);
        }

        let correct_index = rand::rng().random_range(0..OPTION_COUNT);
        let question = Question {
            id: ulid::Ulid::new().to_string(),
            options: candidates[..OPTION_COUNT].iter().map(|c| c.display()).collect(),
            correct_index,
            media_ref: extract_youtube_id(&candidates[correct_index].media_ref),
            genre_id: genre_id.to_string(),
        };

        let window_ms = i64::try_from(self.config.answer_window.as_millis()).unwrap_or(i64::MAX);
        let deadline = self.clock.now_ms().saturating_add(window_ms);

        let show = ServerMessage::QuestionShow {
            id: question.id.clone(),
            media_ref: question.media_ref.clone(),
            options: question.options.clone(),
            deadline_ts: deadline,
            round: room.round,
            total_rounds: room.total_rounds,
        };

        tracing::info!(
            "Room {} round {}/{}: question {} from genre {}",
            room.code,
            room.round,
            room.total_rounds,
            question.id,
            genre_id
        );
        room.open_question(question, deadline);
        room.broadcast(show);
        Ok(())
    }

    /// Record the answer of whoever `connection_id` speaks for.
    ///
    /// Stale, late and duplicate answers are dropped without a trace.
    pub async fn submit_answer(
        &self,
        connection_id: &str,
        room_code: &str,
        question_id: &str,
        option_index: usize,
        elapsed_ms: u64,
    ) -> GameResult<()> {
        let binding = self
            .resolve_connection(connection_id)
            .await
            .ok_or(GameError::Precondition("connection has not joined a room"))?;
        let shared = self
            .get_room(room_code)
            .await
            .ok_or(GameError::Precondition("unknown room"))?;
        let mut room = shared.lock().await;

        let answer = Answer {
            option_index,
            elapsed_ms,
            received_at: self.clock.now_ms(),
        };
        room.accept_answer(&binding.user_id, connection_id, question_id, answer)?;

        tracing::debug!(
            "Room {}: {} answered {} with option {}",
            room.code,
            binding.user_id,
            question_id,
            option_index
        );
        room.broadcast(ServerMessage::AnswerUpdate {
            user_id: binding.user_id,
            option_index,
        });
        Ok(())
    }

    /// Score the open question, publish the ranking and advance the round
    pub async fn reveal(&self, connection_id: &str) -> GameResult<()> {
        let binding = self
            .resolve_connection(connection_id)
            .await
            .ok_or(GameError::Precondition("connection has not joined a room"))?;
        let shared = self
            .get_room(&binding.room_code)
            .await
            .ok_or(GameError::Precondition("unknown room"))?;
        let mut room = shared.lock().await;

        if !room.is_current_connection(&binding.user_id, connection_id) {
            return Err(GameError::Precondition("not this connection's participant"));
        }
        let (question, deadline, answers) = room
            .take_question()
            .ok_or(GameError::Precondition("no open question"))?;

        let mut updates = Vec::new();
        for user_id in room.order().to_vec() {
            let Some(answer) = answers.get(&user_id) else {
                continue;
            };
            if answer.option_index != question.correct_index {
                continue;
            }
            let delta =
                self.scorer
                    .score(&room.scoring, answer.elapsed_ms, deadline, answer.received_at);
            if let Some(total) = room.award(&user_id, delta) {
                updates.push(ScoreUpdate {
                    user_id,
                    delta,
                    total,
                });
            }
        }

        let ranking = room.rank();
        tracing::info!(
            "Room {} round {}: revealed {} ({} of {} correct)",
            room.code,
            room.round,
            question.id,
            updates.len(),
            answers.len()
        );
        room.broadcast(ServerMessage::AnswerReveal {
            correct_index: question.correct_index,
            updates,
            ranking: ranking.clone(),
        });

        room.round += 1;
        if room.round > room.total_rounds {
            room.status = RoomStatus::Ended;
            tracing::info!("Game in room {} ended", room.code);
            room.broadcast(ServerMessage::GameEnd { ranking });
        }
        Ok(())
    }
}
