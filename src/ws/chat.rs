//! Chat relay and the assistant side path

use crate::error::{EventError, EventResult};
use crate::llm::{ask_assistant, LlmError};
use crate::protocol::ServerEvent;
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

pub async fn handle_message(
    state: &Arc<AppState>,
    conn_id: &str,
    room: RoomId,
    message: String,
    claimed_sender: Option<String>,
) -> EventResult {
    let identity = state
        .registry
        .lookup(conn_id)
        .await
        .ok_or(EventError::NotJoined)?;

    if identity.room_id != room {
        return Err(EventError::RoomMismatch {
            joined: identity.room_id,
            requested: room,
        });
    }

    if let Some(claimed) = claimed_sender.as_deref() {
        if claimed != identity.display_name {
            tracing::debug!(
                conn_id = %conn_id,
                "Message claims sender {} but connection joined as {}",
                claimed,
                identity.display_name
            );
        }
    }

    tracing::info!(
        "Message from {} in room {}: {}",
        identity.display_name,
        room,
        message.chars().take(100).collect::<String>()
    );

    // The sender already shows its own copy
    state
        .broadcast_to_room(
            &room,
            Some(conn_id),
            ServerEvent::Message {
                room_id: room.clone(),
                sender: identity.display_name,
                content: message.clone(),
            },
        )
        .await;

    if let Some(prompt) = state.assistant_config.extract_prompt(&message) {
        spawn_assistant_reply(
            Arc::clone(state),
            conn_id.to_string(),
            room,
            prompt.to_string(),
        );
    }

    Ok(())
}

/// Ask the assistant off the event path.
///
/// The task holds no lock while waiting. Its reply goes to whoever is in the
/// room when it completes; a failure goes to the asker only.
fn spawn_assistant_reply(state: Arc<AppState>, conn_id: ConnId, room_id: RoomId, prompt: String) {
    tokio::spawn(async move {
        let config = &state.assistant_config;

        let reply = match (&state.assistant, prompt.is_empty()) {
            (_, true) => Err(LlmError::ConfigError("empty prompt".to_string())),
            (None, false) => Err(LlmError::ConfigError(
                "no assistant provider configured".to_string(),
            )),
            (Some(provider), false) => {
                ask_assistant(
                    provider.as_ref(),
                    &prompt,
                    state.llm_config.default_timeout,
                    state.llm_config.default_max_tokens,
                )
                .await
            }
        };

        match reply {
            Ok(text) => {
                let delivered = state
                    .broadcast_to_room(
                        &room_id,
                        None,
                        ServerEvent::Message {
                            room_id: room_id.clone(),
                            sender: config.sender_name.clone(),
                            content: text,
                        },
                    )
                    .await;
                tracing::info!(room = %room_id, delivered, "Assistant reply delivered");
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = %conn_id,
                    room = %room_id,
                    "Assistant request failed: {}",
                    e
                );
                state
                    .send_to_connection(
                        &conn_id,
                        ServerEvent::Message {
                            room_id,
                            sender: config.sender_name.clone(),
                            content: config.fallback_message.clone(),
                        },
                    )
                    .await;
            }
        }
    });
}
