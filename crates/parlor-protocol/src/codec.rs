//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw frame
//! bytes. The registry and the connection handler only see [`Codec`]; they
//! don't care how an event is laid out on the wire, so the frame format can
//! change without touching room logic.
//!
//! [`JsonCodec`] is the format browser clients speak: one JSON object per
//! frame, `{"event": <name>, "data": <payload>}`.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to frame bytes and decodes them back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync`: the codec sits in the shared server state and every
///   connection task uses it, on whichever Tokio worker thread it runs.
/// - `'static`: the codec owns everything it needs and borrows nothing
///   temporary, so it can live as long as the server does.
///
/// ## Generic methods
///
/// `encode` and `decode` work for any `T` with the right serde trait. The
/// same codec handles `ServerEvent`s going out and `ClientEvent`s coming in.
///
/// `decode` asks for `DeserializeOwned` rather than plain `Deserialize`:
/// the decoded event owns its strings instead of borrowing from the frame,
/// so the receive buffer can be dropped as soon as decoding returns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] producing JSON text, the format browser clients speak.
///
/// ```rust
/// use parlor_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec
///     .decode(br#"{"event":"joinOrCreateRoom","data":"chat"}"#)
///     .unwrap();
/// assert_eq!(event, ClientEvent::JoinOrCreateRoom("chat".into()));
///
/// let bytes = codec.encode(&event).unwrap();
/// assert_eq!(bytes, br#"{"event":"joinOrCreateRoom","data":"chat"}"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
