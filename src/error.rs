//! Per-event error types
//!
//! None of these are fatal: the dispatcher logs them and drops the event.

use crate::types::{ConnId, RoomId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("malformed event: {0}")]
    Malformed(String),

    #[error("connection has not joined a room")]
    NotJoined,

    #[error("connection is joined to {joined}, not {requested}")]
    RoomMismatch { joined: RoomId, requested: RoomId },

    #[error("connection {0} is no longer live")]
    ConnectionGone(ConnId),
}

pub type EventResult<T = ()> = Result<T, EventError>;
