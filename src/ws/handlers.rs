//! Event dispatch
//!
//! Single entry point for inbound events. Payloads are validated here, the
//! connection lock is taken, then the event goes to its concern's handler.
//! Errors never leave this module: they are logged and the event is dropped.

use crate::error::{EventError, EventResult};
use crate::protocol::ClientEvent;
use crate::state::AppState;
use std::sync::Arc;

use super::{canvas, chat, room, signaling};

/// Decode a raw text frame and dispatch it
pub async fn handle_text(text: &str, conn_id: &str, state: &Arc<AppState>) -> EventResult {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            let err = EventError::Malformed(e.to_string());
            tracing::warn!(conn_id = %conn_id, "Dropping undecodable event: {}", err);
            return Err(err);
        }
    };
    handle_event(event, conn_id, state).await
}

/// Handle one decoded event for `conn_id`
pub async fn handle_event(event: ClientEvent, conn_id: &str, state: &Arc<AppState>) -> EventResult {
    let name = event.name();
    let result = dispatch(event, conn_id, state).await;

    if let Err(ref e) = result {
        match e {
            EventError::Malformed(_) => {
                tracing::warn!(conn_id = %conn_id, event = name, "Dropping malformed event: {}", e)
            }
            EventError::ConnectionGone(_) => {
                tracing::debug!(conn_id = %conn_id, event = name, "Dropping event: {}", e)
            }
            EventError::NotJoined | EventError::RoomMismatch { .. } => {
                tracing::info!(conn_id = %conn_id, event = name, "Ignoring event: {}", e)
            }
        }
    }
    result
}

async fn dispatch(event: ClientEvent, conn_id: &str, state: &Arc<AppState>) -> EventResult {
    event.validate()?;

    let _guard = state
        .lock_connection(conn_id)
        .await
        .ok_or_else(|| EventError::ConnectionGone(conn_id.to_string()))?;

    match event {
        // Presence
        ClientEvent::JoinRoom { room, username } => {
            room::handle_join_room(state, conn_id, room, username).await
        }

        ClientEvent::LeaveRoom { room, .. } => room::handle_leave_room(state, conn_id, room).await,

        // Chat
        ClientEvent::Message {
            room,
            message,
            sender,
        } => chat::handle_message(state, conn_id, room, message, sender).await,

        // Editor and whiteboard pass-through
        ClientEvent::CodeUpdate { room_id, code } => {
            canvas::handle_code_update(state, conn_id, room_id, code).await
        }

        ClientEvent::LanguageChange { room_id, language } => {
            canvas::handle_language_change(state, conn_id, room_id, language).await
        }

        ClientEvent::Draw {
            x0,
            y0,
            x1,
            y1,
            color,
            room_id,
            nickname,
        } => {
            let stroke = crate::types::Stroke {
                x0,
                y0,
                x1,
                y1,
                color,
                nickname,
            };
            canvas::handle_draw(state, conn_id, room_id, stroke).await
        }

        ClientEvent::ClearCanvas { room } => {
            canvas::handle_clear_canvas(state, conn_id, room).await
        }

        // Calls and signaling
        ClientEvent::StartCall { room_id } => {
            signaling::handle_call_started(state, conn_id, room_id).await
        }

        ClientEvent::StopCall { room_id } => {
            signaling::handle_call_stopped(state, conn_id, room_id).await
        }

        ClientEvent::Offer { to, sdp } => {
            signaling::relay(state, conn_id, &to, signaling::Signal::Offer(sdp)).await
        }

        ClientEvent::Answer { to, sdp } => {
            signaling::relay(state, conn_id, &to, signaling::Signal::Answer(sdp)).await
        }

        ClientEvent::IceCandidate { to, candidate } => {
            signaling::relay(state, conn_id, &to, signaling::Signal::IceCandidate(candidate)).await
        }
    }
}

/// Transport-level disconnect. Safe to call more than once.
pub async fn handle_disconnect(conn_id: &str, state: &Arc<AppState>) {
    let Some(_guard) = state.lock_connection(conn_id).await else {
        tracing::debug!(conn_id = %conn_id, "Disconnect for unknown connection");
        return;
    };
    room::handle_disconnect(state, conn_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerEvent;

    #[tokio::test]
    async fn test_undecodable_text_is_dropped() {
        let state = Arc::new(AppState::new());
        let (conn, mut rx) = state.connect().await;

        let result = handle_text("{not json", &conn, &state).await;
        assert!(matches!(result, Err(EventError::Malformed(_))));

        let missing_name = r#"{"event":"join-room","data":{"room":"R1"}}"#;
        let result = handle_text(missing_name, &conn, &state).await;
        assert!(matches!(result, Err(EventError::Malformed(_))));

        assert!(rx.try_recv().is_err());
        assert!(state.registry.lookup(&conn).await.is_none());
    }

    #[tokio::test]
    async fn test_text_join_room() {
        let state = Arc::new(AppState::new());
        let (conn, mut rx) = state.connect().await;

        handle_text(
            r#"{"event":"join-room","data":{"room":"R1","username":"alice"}}"#,
            &conn,
            &state,
        )
        .await
        .unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::UpdateUsers(vec!["alice".to_string()])
        );
    }

    #[tokio::test]
    async fn test_events_after_disconnect_are_rejected() {
        let state = Arc::new(AppState::new());
        let (conn, _rx) = state.connect().await;

        handle_disconnect(&conn, &state).await;
        // Second disconnect is a no-op
        handle_disconnect(&conn, &state).await;

        let result = handle_event(
            ClientEvent::JoinRoom {
                room: "R1".to_string(),
                username: "alice".to_string(),
            },
            &conn,
            &state,
        )
        .await;

        assert!(matches!(result, Err(EventError::ConnectionGone(_))));
        assert!(state.directory.members_of("R1").await.is_empty());
    }
}
