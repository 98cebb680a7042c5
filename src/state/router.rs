//! Broadcast router
//!
//! Every live connection owns a bounded outbox; the socket task drains it.
//! Sends are fire-and-forget: a closed or full outbox is skipped without
//! affecting other recipients.

use crate::protocol::ServerEvent;
use crate::types::ConnId;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

/// Events queued per connection before further events to it are dropped
pub const OUTBOX_CAPACITY: usize = 256;

pub type Outbox = mpsc::Sender<ServerEvent>;
pub type OutboxReceiver = mpsc::Receiver<ServerEvent>;

/// Queue `event` without waiting on a slow reader
fn offer(conn_id: &str, outbox: &Outbox, event: ServerEvent) -> bool {
    match outbox.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::warn!(
                conn_id = %conn_id,
                "Outbox full, dropping {} event",
                event.name()
            );
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[derive(Debug, Default)]
pub struct BroadcastRouter {
    outboxes: RwLock<HashMap<ConnId, Outbox>>,
}

impl BroadcastRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbox for a new connection
    pub async fn register(&self, conn_id: &str) -> OutboxReceiver {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        self.outboxes.write().await.insert(conn_id.to_string(), tx);
        rx
    }

    pub async fn unregister(&self, conn_id: &str) -> bool {
        self.outboxes.write().await.remove(conn_id).is_some()
    }

    /// Deliver to one connection. Unknown ids are a silent no-op.
    pub async fn send_to_connection(&self, conn_id: &str, event: ServerEvent) -> bool {
        match self.outboxes.read().await.get(conn_id) {
            Some(outbox) => offer(conn_id, outbox, event),
            None => false,
        }
    }

    /// Deliver to each of `recipients` except `exclude`, returning how many
    /// outboxes accepted the event
    pub async fn deliver(
        &self,
        recipients: &[ConnId],
        exclude: Option<&str>,
        event: &ServerEvent,
    ) -> usize {
        let outboxes = self.outboxes.read().await;
        recipients
            .iter()
            .filter(|id| Some(id.as_str()) != exclude)
            .filter_map(|id| outboxes.get(id).map(|outbox| (id, outbox)))
            .filter(|(id, outbox)| offer(id, outbox, event.clone()))
            .count()
    }

    /// Deliver to every live connection
    pub async fn broadcast_global(&self, event: &ServerEvent) -> usize {
        self.outboxes
            .read()
            .await
            .iter()
            .filter(|(id, outbox)| offer(id, outbox, event.clone()))
            .count()
    }

    pub async fn len(&self) -> usize {
        self.outboxes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outboxes.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(id: &str) -> ServerEvent {
        ServerEvent::UserDisconnected { id: id.to_string() }
    }

    #[tokio::test]
    async fn test_deliver_excludes_sender() {
        let router = BroadcastRouter::new();
        let mut rx1 = router.register("c1").await;
        let mut rx2 = router.register("c2").await;

        let recipients = vec!["c1".to_string(), "c2".to_string()];
        let delivered = router.deliver(&recipients, Some("c1"), &ping("x")).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx2.try_recv().unwrap(), ping("x"));
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deliver_without_exclusion_reaches_everyone() {
        let router = BroadcastRouter::new();
        let mut rx1 = router.register("c1").await;
        let mut rx2 = router.register("c2").await;

        let recipients = vec!["c1".to_string(), "c2".to_string()];
        assert_eq!(router.deliver(&recipients, None, &ping("x")).await, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_closed_outbox_does_not_block_others() {
        let router = BroadcastRouter::new();
        let rx1 = router.register("c1").await;
        let mut rx2 = router.register("c2").await;
        drop(rx1);

        let recipients = vec!["c1".to_string(), "c2".to_string()];
        assert_eq!(router.deliver(&recipients, None, &ping("x")).await, 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_full_outbox_drops_without_blocking_others() {
        let router = BroadcastRouter::new();
        let mut stalled = router.register("c1").await;
        let mut reader = router.register("c2").await;
        let recipients = vec!["c1".to_string(), "c2".to_string()];

        for _ in 0..OUTBOX_CAPACITY + 50 {
            router.deliver(&recipients, None, &ping("x")).await;
            assert_eq!(reader.try_recv().unwrap(), ping("x"));
        }

        // Sends to the stalled reader are refused once it is full
        assert!(!router.send_to_connection("c1", ping("y")).await);
        assert_eq!(router.deliver(&recipients, None, &ping("z")).await, 1);
        assert_eq!(router.broadcast_global(&ping("z")).await, 1);

        let mut queued = 0;
        while let Ok(event) = stalled.try_recv() {
            assert_eq!(event, ping("x"));
            queued += 1;
        }
        assert_eq!(queued, OUTBOX_CAPACITY);

        // Draining frees room again
        assert!(router.send_to_connection("c1", ping("y")).await);
        assert_eq!(stalled.try_recv().unwrap(), ping("y"));
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_noop() {
        let router = BroadcastRouter::new();
        assert!(!router.send_to_connection("ghost", ping("x")).await);
    }

    #[tokio::test]
    async fn test_broadcast_global_and_unregister() {
        let router = BroadcastRouter::new();
        let mut rx1 = router.register("c1").await;
        let _rx2 = router.register("c2").await;

        assert!(router.unregister("c2").await);
        assert!(!router.unregister("c2").await);
        assert_eq!(router.len().await, 1);

        assert_eq!(router.broadcast_global(&ping("c2")).await, 1);
        assert_eq!(rx1.try_recv().unwrap(), ping("c2"));
    }
}
