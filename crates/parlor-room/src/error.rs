//! Error types for the room layer.

use parlor_protocol::{ClientId, RoomId};

/// Errors that can occur during room operations.
///
/// All of them are recoverable by the caller; none means the registry is
/// in a bad state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No factory is registered under this room type.
    #[error("unrecognized room type {0}")]
    UnrecognizedRoomType(String),

    /// `create_room` was called without an id, or with an empty one.
    #[error("room id cannot be missing or empty")]
    MissingRoomId,

    /// A live room already uses this id.
    #[error("room {0} already exists")]
    DuplicateRoomId(RoomId),

    /// The room does not exist (never created, or removed).
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The type is already registered and redefinition is disabled.
    #[error("room type {0} is already defined")]
    RoomTypeAlreadyDefined(String),

    /// The client sent a room message without being a member.
    #[error("{0} is not in room {1}")]
    NotInRoom(ClientId, RoomId),

    /// The room's behavior refused an application message.
    #[error("message rejected: {0}")]
    MessageRejected(String),
}
