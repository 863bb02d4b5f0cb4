//! Transport adapter for Parlor.
//!
//! The room core never talks to sockets directly. It relies on a small
//! contract, expressed here:
//!
//! - [`Transport`] / [`Connection`] accept peers and move bytes.
//! - [`Broadcaster`] addresses a single endpoint or a named group of
//!   endpoints, and manages group membership.
//!
//! [`Hub`] is the in-process [`Broadcaster`]: every attached endpoint has an
//! outbound queue, and groups are sets of endpoints.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod hub;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use hub::{Hub, Outbound};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connected endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Name of a broadcast group. Parlor uses one group per room, named after
/// the room id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts new incoming connections.
///
/// One implementation per network protocol. The server loop only needs
/// `accept`; everything after that goes through [`Connection`].
///
/// ## Trait bounds explained
///
/// - `Send + Sync + 'static`: the transport is moved into the server and
///   owned by its accept loop for the life of the process.
/// - `type Error: std::error::Error + Send + Sync`: errors cross task
///   boundaries (they are logged from spawned tasks), so they must be
///   sendable between threads.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive frames.
///
/// Methods take `&self`, not `&mut self`: a connection is shared between a
/// writer task draining the outbound queue and the read loop waiting on
/// `recv`, so implementations synchronize internally. Sending and receiving
/// must not block each other.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// Addressed delivery and grouping of endpoints.
///
/// This is what the room registry talks to. It never touches a socket; it
/// asks the broadcaster to deliver a frame to one endpoint or to every
/// endpoint in a named group, and it moves endpoints in and out of groups
/// as clients join and leave rooms.
///
/// Delivery is synchronous and never blocks: implementations enqueue the
/// frame and return. That lets the registry broadcast while it holds its
/// lock without waiting on a slow peer.
///
/// Group membership is owned here, not by the rooms that use the groups.
/// Removing a room therefore leaves its group untouched; whoever removes
/// the room decides what happens to the endpoints still in it.
///
/// `join_group` and `leave_group` take `&mut self` because they change the
/// membership tables. The send methods only read them.
pub trait Broadcaster: Send + Sync + 'static {
    /// Delivers a frame to a single endpoint.
    fn send_to(
        &self,
        endpoint: ConnectionId,
        data: &[u8],
    ) -> Result<(), TransportError>;

    /// Delivers a frame to every endpoint in `group`. Returns how many
    /// endpoints it was queued for.
    fn send_to_group(&self, group: &GroupId, data: &[u8]) -> usize;

    /// Adds an endpoint to a group. Adding twice is a no-op.
    fn join_group(&mut self, endpoint: ConnectionId, group: GroupId);

    /// Removes an endpoint from a group. No-op if it was not a member.
    fn leave_group(&mut self, endpoint: ConnectionId, group: &GroupId);
}
