use super::{AppState, LeaveOutcome};
use crate::types::*;

/// Result of moving a connection into a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Set when the connection was in a different room before this join
    pub previous: Option<(Identity, LeaveOutcome)>,
    /// Presence list of the joined room
    pub members: Vec<String>,
}

impl AppState {
    /// Put a connection into `room_id` under `display_name`.
    ///
    /// A connection already joined elsewhere is moved: its old room
    /// membership is removed in the same directory step. Callers must hold
    /// the connection lock.
    pub async fn join_room(&self, conn_id: &str, room_id: &str, display_name: &str) -> JoinOutcome {
        let previous = self.registry.lookup(conn_id).await;

        let outcome = match previous {
            Some(old) if old.room_id != room_id => {
                let (left, members) = self
                    .directory
                    .move_to(&old.room_id, room_id, conn_id, display_name)
                    .await;
                JoinOutcome {
                    previous: Some((old, left)),
                    members,
                }
            }
            _ => JoinOutcome {
                previous: None,
                members: self.directory.join(room_id, conn_id, display_name).await,
            },
        };

        self.registry
            .identify(conn_id, display_name, room_id)
            .await;
        outcome
    }

    /// Take a connection out of its room, returning who it was.
    ///
    /// `None` when it was not joined, which makes repeated leaves (and a
    /// disconnect after a leave) harmless. Callers must hold the connection lock.
    pub async fn leave_room(&self, conn_id: &str) -> Option<(Identity, LeaveOutcome)> {
        let identity = self.registry.forget(conn_id).await?;
        let outcome = self.directory.leave(&identity.room_id, conn_id).await;
        Some((identity, outcome))
    }
}
