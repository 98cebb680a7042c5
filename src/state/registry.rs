//! Connection registry
//!
//! Maps a connection id to the identity it joined with. This is the only
//! place identity lives; the socket itself carries nothing.

use crate::types::{ConnId, Identity};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    identities: RwLock<HashMap<ConnId, Identity>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or overwrite the identity of `conn_id`, returning the previous one.
    ///
    /// Display names are not unique; two connections may share one.
    pub async fn identify(
        &self,
        conn_id: &str,
        display_name: &str,
        room_id: &str,
    ) -> Option<Identity> {
        self.identities
            .write()
            .await
            .insert(conn_id.to_string(), Identity::new(display_name, room_id))
    }

    /// `None` means the connection has not joined a room
    pub async fn lookup(&self, conn_id: &str) -> Option<Identity> {
        self.identities.read().await.get(conn_id).cloned()
    }

    /// Remove the identity record. Forgetting an unknown id is a no-op.
    pub async fn forget(&self, conn_id: &str) -> Option<Identity> {
        self.identities.write().await.remove(conn_id)
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}
