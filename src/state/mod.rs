pub mod directory;
pub mod registry;
pub mod router;
mod session;

pub use directory::{LeaveOutcome, RoomDirectory};
pub use registry::ConnectionRegistry;
pub use router::{BroadcastRouter, OutboxReceiver, OUTBOX_CAPACITY};
pub use session::JoinOutcome;

use crate::config::AssistantConfig;
use crate::llm::{LlmConfig, LlmProvider};
use crate::protocol::ServerEvent;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Shared hub state, one per process
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub directory: RoomDirectory,
    pub router: BroadcastRouter,
    /// Serializes every event of a single connection
    connection_locks: RwLock<HashMap<ConnId, Arc<Mutex<()>>>>,
    /// None when no provider is configured; prefixed messages then get the fallback
    pub assistant: Option<Arc<dyn LlmProvider>>,
    pub llm_config: LlmConfig,
    pub assistant_config: AssistantConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::new_with_assistant(None, LlmConfig::default(), AssistantConfig::default())
    }

    pub fn new_with_assistant(
        assistant: Option<Arc<dyn LlmProvider>>,
        llm_config: LlmConfig,
        assistant_config: AssistantConfig,
    ) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::new(),
            router: BroadcastRouter::new(),
            connection_locks: RwLock::new(HashMap::new()),
            assistant,
            llm_config,
            assistant_config,
        }
    }

    /// Accept a new transport connection: assigns its id and opens its outbox
    pub async fn connect(&self) -> (ConnId, OutboxReceiver) {
        let conn_id = ulid::Ulid::new().to_string();
        let outbox = self.router.register(&conn_id).await;
        self.connection_locks
            .write()
            .await
            .insert(conn_id.clone(), Arc::new(Mutex::new(())));
        tracing::info!(conn_id = %conn_id, "Connection opened");
        (conn_id, outbox)
    }

    /// Take the per-connection lock. `None` once the connection is gone.
    pub async fn lock_connection(&self, conn_id: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = self.connection_locks.read().await.get(conn_id).cloned()?;
        let guard = lock.lock_owned().await;

        // A disconnect may have retired the lock while we were waiting on it
        if self.connection_locks.read().await.contains_key(conn_id) {
            Some(guard)
        } else {
            None
        }
    }

    /// Retire a connection's lock; later events for it are rejected
    pub(crate) async fn retire_connection_lock(&self, conn_id: &str) {
        self.connection_locks.write().await.remove(conn_id);
    }

    /// Deliver to every connection in a room, optionally skipping one.
    ///
    /// Membership is resolved at call time, so callers that suspended
    /// in between see the room as it is now.
    pub async fn broadcast_to_room(
        &self,
        room_id: &str,
        exclude: Option<&str>,
        event: ServerEvent,
    ) -> usize {
        let recipients = self.directory.connections_of(room_id).await;
        if recipients.is_empty() {
            return 0;
        }
        self.router.deliver(&recipients, exclude, &event).await
    }

    /// Deliver to a single connection; unknown ids are ignored
    pub async fn send_to_connection(&self, conn_id: &str, event: ServerEvent) -> bool {
        self.router.send_to_connection(conn_id, event).await
    }

    /// Deliver to every live connection regardless of room
    pub async fn broadcast_global(&self, event: ServerEvent) -> usize {
        self.router.broadcast_global(&event).await
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_assigns_unique_ids() {
        let state = AppState::new();
        let (a, _rx_a) = state.connect().await;
        let (b, _rx_b) = state.connect().await;

        assert_ne!(a, b);
        assert_eq!(state.router.len().await, 2);
        assert!(state.lock_connection(&a).await.is_some());
    }

    #[tokio::test]
    async fn test_lock_rejected_after_retire() {
        let state = AppState::new();
        let (conn, _rx) = state.connect().await;

        state.retire_connection_lock(&conn).await;
        assert!(state.lock_connection(&conn).await.is_none());
        assert!(state.lock_connection("never-connected").await.is_none());
    }

    #[tokio::test]
    async fn test_lock_serializes_same_connection() {
        let state = Arc::new(AppState::new());
        let (conn, _rx) = state.connect().await;

        let guard = state.lock_connection(&conn).await.unwrap();

        let waiter = {
            let state = state.clone();
            let conn = conn.clone();
            tokio::spawn(async move { state.lock_connection(&conn).await.is_some() })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_broadcast_to_unknown_room_is_noop() {
        let state = AppState::new();
        let (_conn, mut rx) = state.connect().await;

        let delivered = state
            .broadcast_to_room("empty", None, ServerEvent::UpdateUsers(vec![]))
            .await;

        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_room_resolves_current_members() {
        let state = AppState::new();
        let (c1, mut rx1) = state.connect().await;
        let (c2, mut rx2) = state.connect().await;
        let (_c3, mut rx3) = state.connect().await;

        state.directory.join("R1", &c1, "alice").await;
        state.directory.join("R1", &c2, "bob").await;

        let delivered = state
            .broadcast_to_room("R1", Some(&c1), ServerEvent::user_joined("bob"))
            .await;

        assert_eq!(delivered, 1);
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), ServerEvent::user_joined("bob"));
        assert!(rx3.try_recv().is_err());
    }
}
