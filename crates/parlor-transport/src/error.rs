//! Error types for the transport layer.
//!
//! A `TransportError` means bytes could not move: the socket failed, the
//! peer went away, or the hub had nowhere to put a frame. Nothing here
//! knows about events or rooms.

use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    ///
    /// Returned by the hub when an endpoint's outbound queue has no reader
    /// left (its writer task ended), and by connections whose peer is gone.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// No endpoint with this id is attached to the hub.
    ///
    /// Usually a race with disconnect: the registry addressed a client
    /// whose handler already detached it. Callers log and move on.
    #[error("unknown endpoint {0}")]
    UnknownEndpoint(ConnectionId),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
