//! Wire types: identifiers and the events exchanged with clients.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Event names are camelCase to stay compatible with existing browser
//! clients that emit and listen by name.

use std::fmt;

use parlor_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a connected client. One client per transport endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl ClientId {
    /// The transport endpoint this client is reachable at.
    pub fn endpoint(self) -> ConnectionId {
        ConnectionId::new(self.0)
    }
}

impl From<ConnectionId> for ClientId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// A room's unique identifier. Also the name of the room's broadcast group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty string, which is never a valid id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A room's shared state as it appears on the wire: a JSON object.
pub type StateSnapshot = serde_json::Map<String, serde_json::Value>;

/// What a client is allowed to see of a room.
///
/// Sent with `joinedRoom`. Membership and server-side options stay private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: RoomId,
    #[serde(rename = "type")]
    pub room_type: String,
    pub state: StateSnapshot,
}

/// An application message addressed to one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub room_id: RoomId,
    pub message: serde_json::Value,
}

/// Why a join did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinFailure {
    /// The room id or room type the client asked for.
    pub room: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events a client sends to the server.
///
/// A closed set: anything else fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join the first room of this type, creating one if none exists.
    JoinOrCreateRoom(String),
    /// Join a specific room.
    JoinRoomById(RoomId),
    /// Leave a specific room.
    LeaveRoom(RoomId),
    /// Application payload for a room's behavior.
    Message(RoomMessage),
}

impl ClientEvent {
    /// The room id or room type this event is about.
    pub fn target(&self) -> &str {
        match self {
            Self::JoinOrCreateRoom(room_type) => room_type,
            Self::JoinRoomById(id) | Self::LeaveRoom(id) => id.as_str(),
            Self::Message(msg) => msg.room_id.as_str(),
        }
    }

    /// Returns `true` for the events answered by `joinedRoom`/`joinFailed`.
    pub fn is_join(&self) -> bool {
        matches!(self, Self::JoinOrCreateRoom(_) | Self::JoinRoomById(_))
    }
}

/// Events the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Confirms a join. Sent only to the joining client.
    JoinedRoom(RoomView),
    /// The room's full current state, sent to every member after each
    /// change. Older clients listen for `stateUpdate`.
    #[serde(alias = "stateUpdate")]
    StateUpdated(StateSnapshot),
    /// A join request that could not be honored.
    JoinFailed(JoinFailure),
    /// Any other request that failed.
    Error { message: String },
}

impl ServerEvent {
    /// The wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinedRoom(_) => "joinedRoom",
            Self::StateUpdated(_) => "stateUpdated",
            Self::JoinFailed(_) => "joinFailed",
            Self::Error { .. } => "error",
        }
    }
}
