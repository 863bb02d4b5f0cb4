//! Error types for the protocol layer.
//!
//! Each Parlor crate defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning events into frames or frames
//! into events, not in the socket underneath or in room management above.

/// Errors that can occur while encoding or decoding wire events.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error` impl.
/// The `#[error("...")]` attribute on each variant is the message you see
/// when the error is printed or lands in a log line, and it is also what a
/// client reads in an `error` event when its frame could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    ///
    /// Rare with JSON: it needs a value serde cannot represent, such as a
    /// map with non-string keys. The inner `serde_json::Error` is kept so
    /// callers can still inspect line and column information.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an `event` name outside the closed
    /// set, or a `data` payload of the wrong shape (a number where a room
    /// id string was expected, for instance).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
