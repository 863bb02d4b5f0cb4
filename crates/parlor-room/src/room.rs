//! A single room: identity, membership, and shared state.
//!
//! Rooms are plain owned values held by the [`RoomRegistry`](crate::RoomRegistry).
//! Every state replacement pushes a [`StateChanged`] onto the channel the
//! registry handed the room at construction; the registry drains that
//! channel and fans the state out to the room's group.

use std::collections::HashSet;

use parlor_protocol::{ClientId, RoomId, RoomView, StateSnapshot};
use tokio::sync::mpsc;

use crate::RoomState;

/// Raised once per state replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChanged {
    pub room_id: RoomId,
    pub state: RoomState,
}

/// Sending half of the state-change channel.
pub type StateSender = mpsc::UnboundedSender<StateChanged>;

/// One session instance.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    room_type: String,
    members: HashSet<ClientId>,
    state: RoomState,
    options: StateSnapshot,
    notifier: StateSender,
}

impl Room {
    /// Creates an empty room. State changes are reported on `notifier`.
    pub fn new(
        id: RoomId,
        room_type: impl Into<String>,
        options: StateSnapshot,
        notifier: StateSender,
    ) -> Self {
        Self {
            id,
            room_type: room_type.into(),
            members: HashSet::new(),
            state: RoomState::new(),
            options,
            notifier,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn room_type(&self) -> &str {
        &self.room_type
    }

    /// Construction options the room was created with.
    pub fn options(&self) -> &StateSnapshot {
        &self.options
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn members(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.members.iter().copied()
    }

    pub fn has_member(&self, client: ClientId) -> bool {
        self.members.contains(&client)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Adds a member. Returns `false` if it was already present.
    pub fn add_member(&mut self, client: ClientId) -> bool {
        let added = self.members.insert(client);
        if added {
            tracing::info!(
                room_id = %self.id,
                %client,
                members = self.members.len(),
                "client joined room"
            );
        }
        added
    }

    /// Removes a member. Returns `false` if it was not present.
    pub fn remove_member(&mut self, client: ClientId) -> bool {
        let removed = self.members.remove(&client);
        if removed {
            tracing::info!(
                room_id = %self.id,
                %client,
                members = self.members.len(),
                "client left room"
            );
        }
        removed
    }

    /// Replaces the state with `f(current)` and raises one notification.
    pub fn update_state<F>(&mut self, f: F)
    where
        F: FnOnce(&RoomState) -> RoomState,
    {
        let next = f(&self.state);
        self.replace_state(next);
    }

    /// Like [`update_state`](Self::update_state), but `f` may refuse.
    ///
    /// On `Err` the state is left exactly as it was, nothing is raised,
    /// and the error is returned.
    pub fn try_update_state<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&RoomState) -> Result<RoomState, E>,
    {
        let next = f(&self.state)?;
        self.replace_state(next);
        Ok(())
    }

    /// Shallow-merges `patch` into the state. See [`RoomState::merged`].
    pub fn merge_state(&mut self, patch: impl Into<RoomState>) {
        let patch = patch.into();
        self.update_state(|current| current.merged(&patch));
    }

    /// The client-facing view: id, type, and state.
    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            room_type: self.room_type.clone(),
            state: self.state.as_snapshot().clone(),
        }
    }

    fn replace_state(&mut self, next: RoomState) {
        self.state = next;
        let change = StateChanged {
            room_id: self.id.clone(),
            state: self.state.clone(),
        };
        // The registry owns the receiver for as long as it owns the room.
        if self.notifier.send(change).is_err() {
            tracing::warn!(room_id = %self.id, "state listener gone, change not broadcast");
        }
    }
}
