use crate::error::{EventError, EventResult};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Longest room identifier accepted from a client
pub const MAX_ROOM_ID_LEN: usize = 128;
/// Longest display name accepted from a client
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Inbound events. On the wire: `{"event": "<name>", "data": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join-room")]
    JoinRoom { room: RoomId, username: String },

    #[serde(rename = "message")]
    Message {
        room: RoomId,
        message: String,
        /// Client-claimed sender; the registry identity is what gets relayed
        #[serde(default)]
        sender: Option<String>,
    },

    #[serde(rename = "code-update")]
    CodeUpdate {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        code: String,
    },

    #[serde(rename = "language-change")]
    LanguageChange {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        language: String,
    },

    #[serde(rename = "draw")]
    Draw {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: String,
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(default)]
        nickname: Option<String>,
    },

    #[serde(rename = "clear-canvas")]
    ClearCanvas { room: RoomId },

    #[serde(rename = "start-call")]
    StartCall {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    #[serde(rename = "stop-call")]
    StopCall {
        #[serde(rename = "roomId")]
        room_id: RoomId,
    },

    #[serde(rename = "offer")]
    Offer { to: ConnId, sdp: serde_json::Value },

    #[serde(rename = "answer")]
    Answer { to: ConnId, sdp: serde_json::Value },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        to: ConnId,
        candidate: serde_json::Value,
    },

    #[serde(rename = "leave-room")]
    LeaveRoom {
        room: RoomId,
        #[serde(default)]
        username: Option<String>,
    },
}

impl ClientEvent {
    /// Wire name of the event, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom { .. } => "join-room",
            ClientEvent::Message { .. } => "message",
            ClientEvent::CodeUpdate { .. } => "code-update",
            ClientEvent::LanguageChange { .. } => "language-change",
            ClientEvent::Draw { .. } => "draw",
            ClientEvent::ClearCanvas { .. } => "clear-canvas",
            ClientEvent::StartCall { .. } => "start-call",
            ClientEvent::StopCall { .. } => "stop-call",
            ClientEvent::Offer { .. } => "offer",
            ClientEvent::Answer { .. } => "answer",
            ClientEvent::IceCandidate { .. } => "ice-candidate",
            ClientEvent::LeaveRoom { .. } => "leave-room",
        }
    }

    /// Reject payloads that deserialized but carry unusable values
    pub fn validate(&self) -> EventResult {
        match self {
            ClientEvent::JoinRoom { room, username } => {
                validate_room(room)?;
                let name = username.trim();
                if name.is_empty() {
                    return Err(EventError::Malformed("username is empty".to_string()));
                }
                if name.chars().count() > MAX_DISPLAY_NAME_LEN {
                    return Err(EventError::Malformed(format!(
                        "username exceeds {} characters",
                        MAX_DISPLAY_NAME_LEN
                    )));
                }
                Ok(())
            }
            ClientEvent::Message { room, .. }
            | ClientEvent::ClearCanvas { room }
            | ClientEvent::LeaveRoom { room, .. } => validate_room(room),
            ClientEvent::CodeUpdate { room_id, .. }
            | ClientEvent::LanguageChange { room_id, .. }
            | ClientEvent::StartCall { room_id }
            | ClientEvent::StopCall { room_id } => validate_room(room_id),
            ClientEvent::Draw {
                x0,
                y0,
                x1,
                y1,
                room_id,
                ..
            } => {
                validate_room(room_id)?;
                if [x0, y0, x1, y1].iter().any(|v| !v.is_finite()) {
                    return Err(EventError::Malformed(
                        "stroke coordinates must be finite".to_string(),
                    ));
                }
                Ok(())
            }
            ClientEvent::Offer { to, .. }
            | ClientEvent::Answer { to, .. }
            | ClientEvent::IceCandidate { to, .. } => {
                if to.trim().is_empty() {
                    Err(EventError::Malformed("signaling target is empty".to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn validate_room(room: &str) -> EventResult {
    if room.trim().is_empty() {
        return Err(EventError::Malformed("room is empty".to_string()));
    }
    if room.len() > MAX_ROOM_ID_LEN {
        return Err(EventError::Malformed(format!(
            "room exceeds {} bytes",
            MAX_ROOM_ID_LEN
        )));
    }
    Ok(())
}

/// Outbound events, same `{"event", "data"}` envelope as inbound ones
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Sent once to a new connection so it learns its own identifier
    #[serde(rename = "connected")]
    Connected {
        id: ConnId,
        #[serde(rename = "serverNow")]
        server_now: String,
    },

    #[serde(rename = "user_joined")]
    UserJoined(String),

    #[serde(rename = "user_left")]
    UserLeft(String),

    /// Presence snapshot of a room
    #[serde(rename = "update-users")]
    UpdateUsers(Vec<String>),

    /// Signaling bootstrap: tells peers which connection just arrived
    #[serde(rename = "new-user")]
    NewUser { id: ConnId, username: String },

    #[serde(rename = "message")]
    Message {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        sender: String,
        content: String,
    },

    #[serde(rename = "code-broadcast")]
    CodeBroadcast { code: String },

    #[serde(rename = "language-broadcast")]
    LanguageBroadcast { language: String },

    #[serde(rename = "draw")]
    Draw(Stroke),

    #[serde(rename = "clear-canvas")]
    ClearCanvas { room: RoomId },

    #[serde(rename = "user-started-call")]
    UserStartedCall { id: ConnId },

    #[serde(rename = "user-stopped-call")]
    UserStoppedCall { id: ConnId },

    #[serde(rename = "user-disconnected")]
    UserDisconnected { id: ConnId },

    #[serde(rename = "offer")]
    Offer { from: ConnId, sdp: serde_json::Value },

    #[serde(rename = "answer")]
    Answer { from: ConnId, sdp: serde_json::Value },

    #[serde(rename = "ice-candidate")]
    IceCandidate {
        from: ConnId,
        candidate: serde_json::Value,
    },
}

impl ServerEvent {
    pub fn user_joined(username: &str) -> Self {
        ServerEvent::UserJoined(format!("{} joined room", username))
    }

    pub fn user_left(username: &str) -> Self {
        ServerEvent::UserLeft(format!("{} left the room", username))
    }

    /// Wire name, for logs
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::UserJoined(_) => "user_joined",
            ServerEvent::UserLeft(_) => "user_left",
            ServerEvent::UpdateUsers(_) => "update-users",
            ServerEvent::NewUser { .. } => "new-user",
            ServerEvent::Message { .. } => "message",
            ServerEvent::CodeBroadcast { .. } => "code-broadcast",
            ServerEvent::LanguageBroadcast { .. } => "language-broadcast",
            ServerEvent::Draw(_) => "draw",
            ServerEvent::ClearCanvas { .. } => "clear-canvas",
            ServerEvent::UserStartedCall { .. } => "user-started-call",
            ServerEvent::UserStoppedCall { .. } => "user-stopped-call",
            ServerEvent::UserDisconnected { .. } => "user-disconnected",
            ServerEvent::Offer { .. } => "offer",
            ServerEvent::Answer { .. } => "answer",
            ServerEvent::IceCandidate { .. } => "ice-candidate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_room() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "join-room",
            "data": { "room": "R1", "username": "alice" }
        }))
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: "R1".to_string(),
                username: "alice".to_string()
            }
        );
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_parse_camel_case_room_id() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "code-update",
            "data": { "roomId": "R1", "code": "fn main() {}" }
        }))
        .unwrap();

        match event {
            ClientEvent::CodeUpdate { room_id, code } => {
                assert_eq!(room_id, "R1");
                assert_eq!(code, "fn main() {}");
            }
            other => panic!("Expected CodeUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_draw_with_optional_nickname() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "draw",
            "data": { "x0": 0, "y0": 1.5, "x1": 2, "y1": 3, "color": "#000", "roomId": "R1" }
        }))
        .unwrap();

        match event {
            ClientEvent::Draw { y0, nickname, .. } => {
                assert_eq!(y0, 1.5);
                assert!(nickname.is_none());
            }
            other => panic!("Expected Draw, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let result = serde_json::from_value::<ClientEvent>(json!({
            "event": "join-room",
            "data": { "room": "R1" }
        }));
        assert!(result.is_err());

        let result = serde_json::from_value::<ClientEvent>(json!({
            "event": "teleport",
            "data": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_values() {
        let blank_room = ClientEvent::ClearCanvas {
            room: "   ".to_string(),
        };
        assert!(matches!(blank_room.validate(), Err(EventError::Malformed(_))));

        let blank_name = ClientEvent::JoinRoom {
            room: "R1".to_string(),
            username: " ".to_string(),
        };
        assert!(blank_name.validate().is_err());

        let blank_target = ClientEvent::Offer {
            to: String::new(),
            sdp: json!({}),
        };
        assert!(blank_target.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_room() {
        let event = ClientEvent::StartCall {
            room_id: "x".repeat(MAX_ROOM_ID_LEN + 1),
        };
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let value = serde_json::to_value(ServerEvent::UpdateUsers(vec![
            "alice".to_string(),
            "bob".to_string(),
        ]))
        .unwrap();
        assert_eq!(value, json!({ "event": "update-users", "data": ["alice", "bob"] }));

        let value = serde_json::to_value(ServerEvent::Message {
            room_id: "R1".to_string(),
            sender: "alice".to_string(),
            content: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "event": "message",
                "data": { "roomId": "R1", "sender": "alice", "content": "hello" }
            })
        );

        let value = serde_json::to_value(ServerEvent::user_left("bob")).unwrap();
        assert_eq!(value, json!({ "event": "user_left", "data": "bob left the room" }));
    }

    #[test]
    fn test_server_event_name_matches_tag() {
        let events = [
            ServerEvent::user_joined("alice"),
            ServerEvent::UpdateUsers(vec![]),
            ServerEvent::CodeBroadcast {
                code: "x".to_string(),
            },
            ServerEvent::UserDisconnected {
                id: "c1".to_string(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event.name());
        }
    }
}
