//! Call announcements and WebRTC signaling
//!
//! Offers, answers and ICE candidates are addressed to a connection id, not
//! a room: the target may have left the sender's room and still receive them.

use crate::error::EventResult;
use crate::protocol::ServerEvent;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

/// Point-to-point signaling payloads
#[derive(Debug, Clone)]
pub enum Signal {
    Offer(serde_json::Value),
    Answer(serde_json::Value),
    IceCandidate(serde_json::Value),
}

impl Signal {
    /// Outbound form, stamped with the sender so the target can reply
    fn into_event(self, from: &str) -> ServerEvent {
        let from = from.to_string();
        match self {
            Signal::Offer(sdp) => ServerEvent::Offer { from, sdp },
            Signal::Answer(sdp) => ServerEvent::Answer { from, sdp },
            Signal::IceCandidate(candidate) => ServerEvent::IceCandidate { from, candidate },
        }
    }
}

pub async fn relay(state: &Arc<AppState>, conn_id: &str, to: &str, signal: Signal) -> EventResult {
    let delivered = state
        .send_to_connection(to, signal.into_event(conn_id))
        .await;
    if !delivered {
        // Peer likely hung up already
        tracing::debug!(conn_id = %conn_id, to = %to, "Signaling target is not connected");
    }
    Ok(())
}

pub async fn handle_call_started(
    state: &Arc<AppState>,
    conn_id: &str,
    room_id: RoomId,
) -> EventResult {
    tracing::info!(conn_id = %conn_id, room = %room_id, "Call started");
    state
        .broadcast_to_room(
            &room_id,
            Some(conn_id),
            ServerEvent::UserStartedCall {
                id: conn_id.to_string(),
            },
        )
        .await;
    Ok(())
}

pub async fn handle_call_stopped(
    state: &Arc<AppState>,
    conn_id: &str,
    room_id: RoomId,
) -> EventResult {
    tracing::info!(conn_id = %conn_id, room = %room_id, "Call stopped");
    state
        .broadcast_to_room(
            &room_id,
            Some(conn_id),
            ServerEvent::UserStoppedCall {
                id: conn_id.to_string(),
            },
        )
        .await;
    Ok(())
}
