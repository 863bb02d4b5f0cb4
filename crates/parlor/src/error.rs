//! Unified error type for the Parlor server.

use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (unknown type, missing room, duplicate id).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use parlor_protocol::{ClientEvent, Codec, JsonCodec};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Transport(_)));
        assert!(parlor_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = JsonCodec
            .decode::<ClientEvent>(b"not json")
            .expect_err("invalid frame");
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::UnrecognizedRoomType("ghost".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Room(_)));
        assert_eq!(parlor_err.to_string(), "unrecognized room type ghost");
    }
}
