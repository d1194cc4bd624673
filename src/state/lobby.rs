use super::{AppState, GameError, GameResult, Room};
use crate::protocol::ServerMessage;
use crate::types::*;

impl AppState {
    /// Join (or create, for a host) a room on behalf of `user_id`.
    ///
    /// Rejoining keeps the participant's score and rebinds it to `conn`.
    pub async fn join(
        &self,
        conn: &ConnectionHandle,
        room_code: &str,
        user_id: &str,
        name: &str,
        avatar_url: Option<String>,
        is_host: bool,
    ) -> GameResult<()> {
        // A connection speaks for one participant at a time
        if let Some(previous) = self.resolve_connection(&conn.id).await {
            if previous.room_code != room_code || previous.user_id != user_id {
                if let Err(e) = self
                    .leave(&conn.id, &previous.room_code, &previous.user_id)
                    .await
                {
                    tracing::debug!("Previous binding of {} not left: {}", conn.id, e);
                }
            }
        }

        let shared = match self.get_room(room_code).await {
            Some(room) => room,
            None if is_host => self.create_room(user_id).await,
            None => return Err(GameError::RoomNotFound),
        };
        let mut room = shared.lock().await;
        if room.is_closed() {
            return Err(GameError::RoomNotFound);
        }

        let stale = room.upsert_participant(user_id, name.to_string(), avatar_url, conn.clone());
        if let Some(stale) = stale {
            self.unbind_connection(&stale).await;
        }
        self.bind_connection(&conn.id, &room.code, user_id).await;

        tracing::info!(
            "{} joined room {} ({} participants)",
            user_id,
            room.code,
            room.participant_count()
        );
        room.broadcast(room.room_update());
        Ok(())
    }

    /// Remove `user_id` from a room, if `connection_id` is its live connection
    pub async fn leave(
        &self,
        connection_id: &str,
        room_code: &str,
        user_id: &str,
    ) -> GameResult<()> {
        let shared = self
            .get_room(room_code)
            .await
            .ok_or(GameError::Precondition("unknown room"))?;
        let mut room = shared.lock().await;

        if !room.is_current_connection(user_id, connection_id) {
            return Err(GameError::Precondition("not this connection's participant"));
        }

        self.remove_from_room(&mut room, user_id).await;
        self.unbind_connection(connection_id).await;
        Ok(())
    }

    /// Remove a participant, tell the others, and drop the room if it is now empty
    async fn remove_from_room(&self, room: &mut Room, user_id: &str) {
        if room.remove_participant(user_id).is_none() {
            return;
        }
        tracing::info!("{} left room {}", user_id, room.code);
        room.broadcast(room.room_update());
        self.drop_room_if_empty(room).await;
    }

    /// Lobby -> playing, round 1
    pub async fn start_game(&self, room_code: &str) -> GameResult<()> {
        let shared = self
            .get_room(room_code)
            .await
            .ok_or(GameError::Precondition("unknown room"))?;
        let mut room = shared.lock().await;

        if room.status != RoomStatus::Lobby {
            return Err(GameError::Precondition("game already started"));
        }
        if room.is_empty() {
            return Err(GameError::Precondition("no participants"));
        }

        room.status = RoomStatus::Playing;
        room.round = 1;
        tracing::info!(
            "Game started in room {} with {} participants",
            room.code,
            room.participant_count()
        );
        room.broadcast(ServerMessage::GameStart { round: room.round });
        Ok(())
    }

    /// Connection loss: leave whatever the connection was bound to.
    ///
    /// Silent no-op for connections that never joined or were already unbound.
    pub async fn disconnect(&self, connection_id: &str) {
        let Some(binding) = self.resolve_connection(connection_id).await else {
            return;
        };

        if let Err(e) = self
            .leave(connection_id, &binding.room_code, &binding.user_id)
            .await
        {
            tracing::debug!("Disconnect of {} left nothing: {}", connection_id, e);
        }
        self.unbind_connection(connection_id).await;
    }
}
