use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnId = String;
pub type RoomId = String;

/// Identity a connection carries while it is joined to a room.
///
/// Absence of an identity in the registry means the connection is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub room_id: RoomId,
}

impl Identity {
    pub fn new(display_name: impl Into<String>, room_id: impl Into<RoomId>) -> Self {
        Self {
            display_name: display_name.into(),
            room_id: room_id.into(),
        }
    }
}

/// A single whiteboard line segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stroke {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}
