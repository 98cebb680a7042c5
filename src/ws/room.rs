//! Presence handlers: join, leave and disconnect
//!
//! All of these run with the connection lock held by the dispatcher.

use crate::error::EventResult;
use crate::protocol::ServerEvent;
use crate::state::{AppState, LeaveOutcome};
use crate::types::*;
use std::sync::Arc;

/// Tell a room that `identity` is gone. Nothing is sent when the
/// connection had already left, so late duplicates stay silent.
async fn announce_departure(
    state: &Arc<AppState>,
    conn_id: &str,
    identity: &Identity,
    outcome: LeaveOutcome,
) {
    if !outcome.removed {
        return;
    }
    tracing::info!(
        conn_id = %conn_id,
        "User {} left room {}",
        identity.display_name,
        identity.room_id
    );

    state
        .broadcast_to_room(
            &identity.room_id,
            None,
            ServerEvent::UpdateUsers(outcome.members),
        )
        .await;
    state
        .broadcast_to_room(
            &identity.room_id,
            Some(conn_id),
            ServerEvent::user_left(&identity.display_name),
        )
        .await;
}

pub async fn handle_join_room(
    state: &Arc<AppState>,
    conn_id: &str,
    room: RoomId,
    username: String,
) -> EventResult {
    let username = username.trim().to_string();
    let outcome = state.join_room(conn_id, &room, &username).await;

    if let Some((old, left)) = outcome.previous {
        announce_departure(state, conn_id, &old, left).await;
    }

    tracing::info!(conn_id = %conn_id, "User {} joined room {}", username, room);

    state
        .broadcast_to_room(&room, Some(conn_id), ServerEvent::user_joined(&username))
        .await;
    state
        .broadcast_to_room(&room, None, ServerEvent::UpdateUsers(outcome.members))
        .await;
    state
        .broadcast_to_room(
            &room,
            Some(conn_id),
            ServerEvent::NewUser {
                id: conn_id.to_string(),
                username,
            },
        )
        .await;

    Ok(())
}

pub async fn handle_leave_room(state: &Arc<AppState>, conn_id: &str, room: RoomId) -> EventResult {
    match state.registry.lookup(conn_id).await {
        Some(identity) if identity.room_id == room => {}
        Some(identity) => {
            tracing::debug!(
                conn_id = %conn_id,
                "Ignoring leave for {}, connection is in {}",
                room,
                identity.room_id
            );
            return Ok(());
        }
        None => {
            tracing::debug!(conn_id = %conn_id, "Ignoring leave for {}, not joined", room);
            return Ok(());
        }
    }

    if let Some((identity, outcome)) = state.leave_room(conn_id).await {
        announce_departure(state, conn_id, &identity, outcome).await;
    }
    Ok(())
}

/// Final teardown of a connection
pub async fn handle_disconnect(state: &Arc<AppState>, conn_id: &str) {
    if let Some((identity, outcome)) = state.leave_room(conn_id).await {
        announce_departure(state, conn_id, &identity, outcome).await;
    }

    // Unconditional, covers connections that never joined
    state.registry.forget(conn_id).await;
    state.router.unregister(conn_id).await;
    state.retire_connection_lock(conn_id).await;

    let notified = state
        .broadcast_global(ServerEvent::UserDisconnected {
            id: conn_id.to_string(),
        })
        .await;
    tracing::info!(conn_id = %conn_id, notified, "Connection closed");
}
