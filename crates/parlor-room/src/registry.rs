//! Room registry: owns every live room and the room-type factories.
//!
//! The registry is the only place that knows which rooms exist and which
//! client is in which room. All methods are synchronous and take
//! `&mut self`; a server shares one registry behind a mutex and applies
//! one inbound event at a time. Within a process that makes every
//! operation, `move_client_to_room` included, atomic to other observers.
//! Nothing here coordinates across processes.

use std::collections::HashMap;

use parlor_protocol::{ClientId, Codec, JsonCodec, RoomId, ServerEvent};
use parlor_transport::{Broadcaster, GroupId};
use rand::Rng;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    RegistryConfig, Room, RoomArgs, RoomBehavior, RoomError, RoomFactory,
    RoomState, StateChanged, StateSender,
};

/// A live room and the behavior its type attached to it.
struct RoomEntry {
    room: Room,
    behavior: Box<dyn RoomBehavior>,
}

/// Manages all live rooms, the registered room types, and the fan-out of
/// state changes to each room's transport group.
pub struct RoomRegistry<B: Broadcaster, C: Codec = JsonCodec> {
    /// Live rooms, keyed by id.
    rooms: HashMap<RoomId, RoomEntry>,

    /// Room ids in creation order. Defines iteration order and the
    /// tie-break for `join_or_create_room`.
    order: Vec<RoomId>,

    /// Registered room types.
    factories: HashMap<String, RoomFactory>,

    config: RegistryConfig,
    transport: B,
    codec: C,

    /// Every room holds a clone of this sender.
    changes_tx: StateSender,
    changes_rx: mpsc::UnboundedReceiver<StateChanged>,
}

impl<B: Broadcaster> RoomRegistry<B> {
    /// Creates an empty registry with default settings and JSON frames.
    pub fn new(transport: B) -> Self {
        Self::with_config(transport, RegistryConfig::default())
    }

    /// Creates an empty registry with the given settings and JSON frames.
    pub fn with_config(transport: B, config: RegistryConfig) -> Self {
        Self::with_codec(transport, JsonCodec, config)
    }
}

impl<B: Broadcaster, C: Codec> RoomRegistry<B, C> {
    /// Creates an empty registry that encodes outgoing events with `codec`.
    pub fn with_codec(transport: B, codec: C, config: RegistryConfig) -> Self {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        Self {
            rooms: HashMap::new(),
            order: Vec::new(),
            factories: HashMap::new(),
            config,
            transport,
            codec,
            changes_tx,
            changes_rx,
        }
    }

    // -----------------------------------------------------------------
    // Room types
    // -----------------------------------------------------------------

    /// Registers the factory for `room_type`.
    ///
    /// Redefining a type replaces the factory (rooms already created keep
    /// their behavior), unless `allow_type_redefinition` is off.
    pub fn define_room_type(
        &mut self,
        room_type: impl Into<String>,
        factory: RoomFactory,
    ) -> Result<(), RoomError> {
        let room_type = room_type.into();
        if self.factories.contains_key(&room_type) {
            if !self.config.allow_type_redefinition {
                return Err(RoomError::RoomTypeAlreadyDefined(room_type));
            }
            tracing::warn!(%room_type, "room type redefined, previous factory replaced");
        } else {
            tracing::info!(%room_type, "room type defined");
        }
        self.factories.insert(room_type, factory);
        Ok(())
    }

    /// Returns `true` if a factory is registered for `room_type`.
    pub fn has_room_type(&self, room_type: &str) -> bool {
        self.factories.contains_key(room_type)
    }

    /// Registered room types, sorted.
    pub fn room_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> =
            self.factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    // -----------------------------------------------------------------
    // Room lifecycle
    // -----------------------------------------------------------------

    /// Builds a room of `room_type` and registers it under `args.id`.
    ///
    /// Checks, in order: the type is registered, the id is present and
    /// non-empty, no live room has that id. On failure nothing changes.
    pub fn create_room(
        &mut self,
        room_type: &str,
        args: RoomArgs,
    ) -> Result<RoomId, RoomError> {
        let factory = self
            .factories
            .get(room_type)
            .cloned()
            .ok_or_else(|| RoomError::UnrecognizedRoomType(room_type.to_string()))?;

        let room_id = match &args.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => return Err(RoomError::MissingRoomId),
        };
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::DuplicateRoomId(room_id));
        }

        let mut behavior = factory(&args);
        let mut room = Room::new(
            room_id.clone(),
            room_type,
            args.options,
            self.changes_tx.clone(),
        );
        behavior.on_create(&mut room);

        self.rooms.insert(room_id.clone(), RoomEntry { room, behavior });
        self.order.push(room_id.clone());
        tracing::info!(%room_id, room_type, "room created");

        self.dispatch_state_updates();
        Ok(room_id)
    }

    /// Looks up a live room.
    pub fn get_room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id).map(|entry| &entry.room)
    }

    /// Unregisters a room and returns it. No-op if absent.
    ///
    /// Members are not told and stay in the transport group; evicting them
    /// is up to the caller (see [`close_room`](Self::close_room)). State
    /// changes still queued for the room are broadcast first.
    pub fn remove_room(&mut self, room_id: &RoomId) -> Option<Room> {
        self.dispatch_state_updates();
        let entry = self.rooms.remove(room_id)?;
        self.order.retain(|id| id != room_id);
        tracing::info!(%room_id, members = entry.room.member_count(), "room removed");
        Some(entry.room)
    }

    /// Unregisters a room and takes its members out of the room's
    /// transport group, so a later room reusing the id does not broadcast
    /// to them. Hooks do not run and members are not told.
    pub fn close_room(&mut self, room_id: &RoomId) -> Option<Room> {
        let room = self.remove_room(room_id)?;
        let group = group_of(room_id);
        for client in room.members() {
            self.transport.leave_group(client.endpoint(), &group);
        }
        Some(room)
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Joins the oldest live room of `room_type`, or creates one with a
    /// generated id and no options, then joins it.
    pub fn join_or_create_room(
        &mut self,
        room_type: &str,
        client: ClientId,
    ) -> Result<RoomId, RoomError> {
        let existing = self
            .rooms_of_type(room_type)
            .next()
            .map(|room| room.id().clone());
        let room_id = match existing {
            Some(room_id) => room_id,
            None => {
                let args = RoomArgs {
                    id: Some(self.generate_room_id()),
                    ..RoomArgs::default()
                };
                self.create_room(room_type, args)?
            }
        };

        self.join_room_by_id(&room_id, client)?;
        Ok(room_id)
    }

    /// Adds `client` to the room and sends it `joinedRoom` with the room's
    /// public view.
    ///
    /// Joining a room the client is already in re-sends the confirmation
    /// without running `on_join` again.
    pub fn join_room_by_id(
        &mut self,
        room_id: &RoomId,
        client: ClientId,
    ) -> Result<(), RoomError> {
        if !self.attach_member(room_id, client) {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }

        if let Some(room) = self.get_room(room_id) {
            self.send_to(client, &ServerEvent::JoinedRoom(room.view()));
        }
        self.dispatch_state_updates();
        Ok(())
    }

    /// Removes `client` from the room. Not being a member is a no-op.
    pub fn leave_room(
        &mut self,
        room_id: &RoomId,
        client: ClientId,
    ) -> Result<(), RoomError> {
        if !self.detach_member(room_id, client) {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }
        self.dispatch_state_updates();
        Ok(())
    }

    /// Moves `client` from one room to another.
    ///
    /// Both rooms are checked before either is touched, so a failure
    /// leaves all membership unchanged.
    pub fn move_client_to_room(
        &mut self,
        client: ClientId,
        from: &RoomId,
        to: &RoomId,
    ) -> Result<(), RoomError> {
        for room_id in [from, to] {
            if !self.rooms.contains_key(room_id) {
                return Err(RoomError::RoomNotFound(room_id.clone()));
            }
        }

        self.detach_member(from, client);
        self.attach_member(to, client);
        tracing::debug!(%client, %from, %to, "client moved");

        self.dispatch_state_updates();
        Ok(())
    }

    /// Removes `client` from every room it is in. Call when its connection
    /// goes away. Returns the rooms it left, in creation order.
    pub fn disconnect_client(&mut self, client: ClientId) -> Vec<RoomId> {
        let left = self.client_rooms(client);
        for room_id in &left {
            self.detach_member(room_id, client);
        }
        self.dispatch_state_updates();
        left
    }

    // -----------------------------------------------------------------
    // State and messages
    // -----------------------------------------------------------------

    /// Replaces a room's state with `f(current)` and broadcasts it.
    pub fn update_room_state<F>(
        &mut self,
        room_id: &RoomId,
        f: F,
    ) -> Result<(), RoomError>
    where
        F: FnOnce(&RoomState) -> RoomState,
    {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        entry.room.update_state(f);
        self.dispatch_state_updates();
        Ok(())
    }

    /// Replaces a room's state with `f(current)` if `f` succeeds.
    ///
    /// On `Err` the state is left exactly as it was, nothing is broadcast,
    /// and the error is returned. A missing room is reported through
    /// `E: From<RoomError>`, so `f` can fail with `RoomError` itself.
    pub fn try_update_room_state<F, E>(
        &mut self,
        room_id: &RoomId,
        f: F,
    ) -> Result<(), E>
    where
        F: FnOnce(&RoomState) -> Result<RoomState, E>,
        E: From<RoomError>,
    {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        entry.room.try_update_state(f)?;
        self.dispatch_state_updates();
        Ok(())
    }

    /// Shallow-merges `patch` into a room's state and broadcasts it.
    pub fn merge_room_state(
        &mut self,
        room_id: &RoomId,
        patch: impl Into<RoomState>,
    ) -> Result<(), RoomError> {
        let patch = patch.into();
        self.update_room_state(room_id, |current| current.merged(&patch))
    }

    /// Hands an application message to the room's behavior.
    pub fn route_message(
        &mut self,
        room_id: &RoomId,
        sender: ClientId,
        message: Value,
    ) -> Result<(), RoomError> {
        let entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        if !entry.room.has_member(sender) {
            return Err(RoomError::NotInRoom(sender, room_id.clone()));
        }

        let result = entry.behavior.on_message(&mut entry.room, sender, message);
        // A behavior may have changed state before refusing.
        self.dispatch_state_updates();
        result
    }

    /// Broadcasts every pending state change as `stateUpdated` to its
    /// room's group, oldest first. Returns how many changes were sent.
    pub fn dispatch_state_updates(&mut self) -> usize {
        let mut sent = 0;
        while let Ok(change) = self.changes_rx.try_recv() {
            let event = ServerEvent::StateUpdated(change.state.into_snapshot());
            match self.codec.encode(&event) {
                Ok(bytes) => {
                    let recipients = self
                        .transport
                        .send_to_group(&group_of(&change.room_id), &bytes);
                    tracing::debug!(room_id = %change.room_id, recipients, "state broadcast");
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!(room_id = %change.room_id, error = %e, "state not encodable, dropped");
                }
            }
        }
        sent
    }

    /// Sends one event to one client. Delivery failures are logged, not
    /// returned: the client may already be gone.
    pub fn send_to(&self, client: ClientId, event: &ServerEvent) -> bool {
        let bytes = match self.codec.encode(event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%client, event = event.name(), error = %e, "event not encodable");
                return false;
            }
        };
        match self.transport.send_to(client.endpoint(), &bytes) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%client, event = event.name(), error = %e, "event not delivered");
                false
            }
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Live rooms in creation order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id).map(|entry| &entry.room))
    }

    /// Live rooms of one type in creation order.
    pub fn rooms_of_type<'a>(
        &'a self,
        room_type: &'a str,
    ) -> impl Iterator<Item = &'a Room> + 'a {
        self.rooms().filter(move |room| room.room_type() == room_type)
    }

    /// Ids of the rooms `client` is a member of, in creation order.
    pub fn client_rooms(&self, client: ClientId) -> Vec<RoomId> {
        self.rooms()
            .filter(|room| room.has_member(client))
            .map(|room| room.id().clone())
            .collect()
    }

    /// Live room ids in creation order.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.order.clone()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn transport(&self) -> &B {
        &self.transport
    }

    /// Mutable access to the transport, for attaching and detaching
    /// endpoints as connections come and go.
    pub fn transport_mut(&mut self) -> &mut B {
        &mut self.transport
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Adds the member, wires it into the room's group, runs `on_join` if
    /// it was new. Returns `false` if the room does not exist.
    fn attach_member(&mut self, room_id: &RoomId, client: ClientId) -> bool {
        let Some(entry) = self.rooms.get_mut(room_id) else {
            return false;
        };
        self.transport.join_group(client.endpoint(), group_of(room_id));
        if entry.room.add_member(client) {
            entry.behavior.on_join(&mut entry.room, client);
        }
        true
    }

    /// Removes the member from the room and its group, runs `on_leave` if
    /// it was present. Returns `false` if the room does not exist.
    fn detach_member(&mut self, room_id: &RoomId, client: ClientId) -> bool {
        let Some(entry) = self.rooms.get_mut(room_id) else {
            return false;
        };
        self.transport.leave_group(client.endpoint(), &group_of(room_id));
        if entry.room.remove_member(client) {
            entry.behavior.on_leave(&mut entry.room, client);
        }
        true
    }

    /// `{prefix}` followed by 32 hex chars (128 random bits), retried on
    /// the off chance it is taken.
    fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; 16] = rng.random();
            let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let id = RoomId::new(format!("{}{suffix}", self.config.room_id_prefix));
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// The transport group carrying a room's broadcasts.
pub(crate) fn group_of(room_id: &RoomId) -> GroupId {
    GroupId::new(room_id.as_str())
}
