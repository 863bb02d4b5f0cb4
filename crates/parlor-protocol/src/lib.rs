//! Wire protocol for Parlor.
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomView`], [`RoomId`],
//!   [`ClientId`]): the named events and payloads clients exchange with
//!   the server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become frames.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room registry (rooms, state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ClientId, JoinFailure, RoomId, RoomMessage, RoomView,
    ServerEvent, StateSnapshot,
};
