//! Room directory
//!
//! Tracks, per room, the presence list (distinct display names in join order)
//! and which connections are joined under which name. Rooms are created on
//! first join and dropped once their last connection leaves.

use crate::types::{ConnId, RoomId};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Room {
    /// Distinct display names, in order of first (re-)join
    members: Vec<String>,
    /// Connection id -> display name it joined under
    connections: HashMap<ConnId, String>,
}

impl Room {
    fn admit(&mut self, conn_id: &str, display_name: &str) {
        if self.connections.get(conn_id).map(String::as_str) == Some(display_name) {
            return;
        }
        // Same connection re-joining under another name
        self.release(conn_id);

        self.connections
            .insert(conn_id.to_string(), display_name.to_string());
        if !self.members.iter().any(|m| m == display_name) {
            self.members.push(display_name.to_string());
        }
    }

    /// Returns false if the connection was not in the room.
    ///
    /// A name stays in the presence list while another connection in the
    /// room still uses it.
    fn release(&mut self, conn_id: &str) -> bool {
        let Some(name) = self.connections.remove(conn_id) else {
            return false;
        };
        if !self.connections.values().any(|n| *n == name) {
            self.members.retain(|m| *m != name);
        }
        true
    }
}

/// What a leave did to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// False when the connection was already gone from the room
    pub removed: bool,
    /// Presence list after the leave
    pub members: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a room, returning the updated presence list
    pub async fn join(&self, room_id: &str, conn_id: &str, display_name: &str) -> Vec<String> {
        let mut rooms = self.rooms.write().await;
        join_locked(&mut rooms, room_id, conn_id, display_name)
    }

    /// Remove a connection from a room. Absent room or member is a no-op.
    pub async fn leave(&self, room_id: &str, conn_id: &str) -> LeaveOutcome {
        let mut rooms = self.rooms.write().await;
        leave_locked(&mut rooms, room_id, conn_id)
    }

    /// Leave `from` and join `to` in one step, so no other event can see
    /// the connection in both rooms or in neither.
    pub async fn move_to(
        &self,
        from: &str,
        to: &str,
        conn_id: &str,
        display_name: &str,
    ) -> (LeaveOutcome, Vec<String>) {
        let mut rooms = self.rooms.write().await;
        let left = leave_locked(&mut rooms, from, conn_id);
        let joined = join_locked(&mut rooms, to, conn_id, display_name);
        (left, joined)
    }

    /// Presence snapshot; empty for an unknown room
    pub async fn members_of(&self, room_id: &str) -> Vec<String> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(|room| room.members.clone())
            .unwrap_or_default()
    }

    /// Connection snapshot used for fan-out; empty for an unknown room
    pub async fn connections_of(&self, room_id: &str) -> Vec<ConnId> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map(|room| room.connections.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

fn join_locked(
    rooms: &mut HashMap<RoomId, Room>,
    room_id: &str,
    conn_id: &str,
    display_name: &str,
) -> Vec<String> {
    let room = rooms.entry(room_id.to_string()).or_default();
    room.admit(conn_id, display_name);
    room.members.clone()
}

fn leave_locked(rooms: &mut HashMap<RoomId, Room>, room_id: &str, conn_id: &str) -> LeaveOutcome {
    let Some(room) = rooms.get_mut(room_id) else {
        return LeaveOutcome {
            removed: false,
            members: Vec::new(),
        };
    };

    let removed = room.release(conn_id);
    let members = room.members.clone();
    if room.connections.is_empty() {
        rooms.remove(room_id);
    }

    LeaveOutcome { removed, members }
}
