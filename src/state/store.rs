//! Room registry and connection bindings.
//!
//! Lock order is always room before registry: a room lock may be held while
//! touching `rooms` or `connections`, never the other way round.

use super::{AppState, Room, SharedRoom};
use crate::code;
use crate::types::*;
use std::sync::Arc;
use tokio::sync::Mutex;

impl AppState {
    /// Create a room with a fresh unique code, hosted by `host_id`
    pub async fn create_room(&self, host_id: &str) -> SharedRoom {
        let mut rooms = self.rooms.write().await;

        let code = loop {
            let code = code::generate(self.config.room_code_length);
            if !rooms.contains_key(&code) {
                break code;
            }
            // Collision - try again
        };

        let room = Arc::new(Mutex::new(Room::new(
            code.clone(),
            host_id.to_string(),
            &self.config,
        )));
        rooms.insert(code.clone(), room.clone());

        tracing::info!("Created room {} for host {}", code, host_id);
        room
    }

    pub async fn get_room(&self, code: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(code).cloned()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Drop a room from the registry once nobody is left in it.
    ///
    /// Called with the room locked; the room is marked closed so anyone still
    /// holding its handle stops using it.
    pub(super) async fn drop_room_if_empty(&self, room: &mut Room) {
        if !room.is_empty() {
            return;
        }
        room.close();
        self.rooms.write().await.remove(&room.code);
        tracing::info!("Room {} is empty, dropped", room.code);
    }

    pub async fn bind_connection(&self, connection_id: &str, room_code: &str, user_id: &str) {
        self.connections.write().await.insert(
            connection_id.to_string(),
            Binding {
                room_code: room_code.to_string(),
                user_id: user_id.to_string(),
            },
        );
    }

    pub async fn resolve_connection(&self, connection_id: &str) -> Option<Binding> {
        self.connections.read().await.get(connection_id).cloned()
    }

    pub async fn unbind_connection(&self, connection_id: &str) -> Option<Binding> {
        self.connections.write().await.remove(connection_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
