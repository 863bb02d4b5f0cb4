//! Error types for the client.

use parlor_protocol::ProtocolError;
use tokio_tungstenite::tungstenite;

/// Errors a [`ParlorClient`](crate::ParlorClient) can return.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The WebSocket handshake, a send, or a receive failed.
    ///
    /// The inner error comes straight from `tungstenite`; a refused
    /// connection shows up here as an I/O error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// An event could not be encoded, or a frame from the server did not
    /// decode as a `ServerEvent`.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `send_message` was called before any `joinedRoom` arrived, or after
    /// leaving the room that was joined. Nothing was sent.
    #[error("not joined in any room")]
    NotInRoom,
}
