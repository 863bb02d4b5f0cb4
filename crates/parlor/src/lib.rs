//! # Parlor
//!
//! Room registry and state synchronization for real-time web clients.
//!
//! Clients connect over WebSocket and send control events to join, create,
//! or leave rooms. Each room has a type, a set of members, and a shared
//! JSON state; whenever the state changes, the whole state is pushed to
//! every member. Applications plug in per-type logic by implementing
//! [`RoomBehavior`](parlor_room::RoomBehavior).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn start() -> Result<(), ParlorError> {
//! let server = ParlorServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .room_type("chat", factory(|_| PlainRoom))
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder, SharedRegistry};

pub use parlor_protocol as protocol;
pub use parlor_room as room;
pub use parlor_transport as transport;

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder, SharedRegistry};
    pub use parlor_protocol::{
        ClientEvent, ClientId, Codec, JoinFailure, JsonCodec, RoomId, RoomMessage,
        RoomView, ServerEvent, StateSnapshot,
    };
    pub use parlor_room::{
        factory, PlainRoom, RegistryConfig, Room, RoomArgs, RoomBehavior, RoomError,
        RoomFactory, RoomRegistry, RoomState,
    };
    pub use parlor_transport::Hub;
}
