//! Editor and whiteboard pass-through
//!
//! Stateless relays to everyone else in the room. Nothing here touches the
//! registry or directory, and an empty or unknown room simply gets nothing.

use crate::error::EventResult;
use crate::protocol::ServerEvent;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

async fn relay(state: &Arc<AppState>, conn_id: &str, room_id: &str, event: ServerEvent) {
    let delivered = state.broadcast_to_room(room_id, Some(conn_id), event).await;
    tracing::debug!(conn_id = %conn_id, room = %room_id, delivered, "Relayed room update");
}

pub async fn handle_code_update(
    state: &Arc<AppState>,
    conn_id: &str,
    room_id: RoomId,
    code: String,
) -> EventResult {
    relay(state, conn_id, &room_id, ServerEvent::CodeBroadcast { code }).await;
    Ok(())
}

pub async fn handle_language_change(
    state: &Arc<AppState>,
    conn_id: &str,
    room_id: RoomId,
    language: String,
) -> EventResult {
    relay(
        state,
        conn_id,
        &room_id,
        ServerEvent::LanguageBroadcast { language },
    )
    .await;
    Ok(())
}

pub async fn handle_draw(
    state: &Arc<AppState>,
    conn_id: &str,
    room_id: RoomId,
    stroke: Stroke,
) -> EventResult {
    relay(state, conn_id, &room_id, ServerEvent::Draw(stroke)).await;
    Ok(())
}

pub async fn handle_clear_canvas(
    state: &Arc<AppState>,
    conn_id: &str,
    room: RoomId,
) -> EventResult {
    relay(
        state,
        conn_id,
        &room,
        ServerEvent::ClearCanvas { room: room.clone() },
    )
    .await;
    Ok(())
}
