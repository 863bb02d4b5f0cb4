//! The `RoomBehavior` trait: per-type room logic.
//!
//! A room type is a name plus a factory producing a `RoomBehavior`. The
//! registry calls the hooks at fixed points in the room's life; none of
//! them has base behavior to preserve, so implementors override only what
//! they need.

use std::sync::Arc;

use parlor_protocol::{ClientId, RoomId, StateSnapshot};
use serde_json::Value;

use crate::{Room, RoomError};

/// Type-specific logic attached to a room.
///
/// Hooks receive the room itself and may read it or change its state and
/// membership through the room's own methods. They cannot reach the
/// registry.
pub trait RoomBehavior: Send + Sync + 'static {
    /// Runs once, right after the room is constructed and before it is
    /// registered. Typically seeds the initial state.
    fn on_create(&mut self, _room: &mut Room) {}

    /// Runs once per join that actually added `client` to the room.
    fn on_join(&mut self, _room: &mut Room, _client: ClientId) {}

    /// Runs once per leave that actually removed `client`.
    fn on_leave(&mut self, _room: &mut Room, _client: ClientId) {}

    /// Handles an application message from a member.
    ///
    /// Default: accept and ignore.
    fn on_message(
        &mut self,
        _room: &mut Room,
        _sender: ClientId,
        _message: Value,
    ) -> Result<(), RoomError> {
        Ok(())
    }
}

/// A room type with no custom logic: state changes only come from the
/// server side through the registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainRoom;

impl RoomBehavior for PlainRoom {}

/// Arguments passed to `create_room` and on to the type's factory.
#[derive(Debug, Clone, Default)]
pub struct RoomArgs {
    /// The new room's id. Required by `create_room`.
    pub id: Option<RoomId>,
    /// Free-form options stored on the room.
    pub options: StateSnapshot,
}

impl RoomArgs {
    /// Arguments with the given id and no options.
    pub fn with_id(id: impl Into<RoomId>) -> Self {
        Self {
            id: Some(id.into()),
            options: StateSnapshot::new(),
        }
    }

    /// Adds one option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Produces a behavior for a new room of one type.
pub type RoomFactory = Arc<dyn Fn(&RoomArgs) -> Box<dyn RoomBehavior> + Send + Sync>;

/// Wraps a closure as a [`RoomFactory`].
///
/// ```rust
/// use parlor_room::{factory, PlainRoom};
///
/// let chat = factory(|_args| PlainRoom);
/// # let _ = chat;
/// ```
pub fn factory<B, F>(f: F) -> RoomFactory
where
    B: RoomBehavior,
    F: Fn(&RoomArgs) -> B + Send + Sync + 'static,
{
    Arc::new(move |args: &RoomArgs| Box::new(f(args)) as Box<dyn RoomBehavior>)
}
