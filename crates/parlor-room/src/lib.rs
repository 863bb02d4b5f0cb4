//! Room registry and state synchronization for Parlor.
//!
//! Rooms are named, typed containers of connected clients with a shared
//! key-value state. Every state change is pushed, whole, to every member.
//!
//! # Key types
//!
//! - [`RoomBehavior`]: per-type hooks an application implements
//! - [`RoomRegistry`]: defines types, creates/removes rooms, routes clients
//! - [`Room`]: one room's id, members, and state
//! - [`RoomState`]: the JSON object a room shares with its members
//! - [`RegistryConfig`]: registry settings

mod behavior;
mod config;
mod dispatch;
mod error;
mod registry;
mod room;
mod state;

pub use behavior::{factory, PlainRoom, RoomArgs, RoomBehavior, RoomFactory};
pub use config::RegistryConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Room, StateChanged, StateSender};
pub use state::RoomState;
