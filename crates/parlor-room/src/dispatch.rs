//! Routing of decoded client events onto registry operations.

use parlor_protocol::{ClientEvent, ClientId, Codec, JoinFailure, RoomMessage, ServerEvent};
use parlor_transport::Broadcaster;

use crate::{RoomError, RoomRegistry};

impl<B: Broadcaster, C: Codec> RoomRegistry<B, C> {
    /// Applies one client event on behalf of `client`.
    pub fn dispatch(
        &mut self,
        client: ClientId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        match event {
            ClientEvent::JoinOrCreateRoom(room_type) => {
                self.join_or_create_room(&room_type, client).map(|_| ())
            }
            ClientEvent::JoinRoomById(room_id) => {
                self.join_room_by_id(&room_id, client)
            }
            ClientEvent::LeaveRoom(room_id) => self.leave_room(&room_id, client),
            ClientEvent::Message(RoomMessage { room_id, message }) => {
                self.route_message(&room_id, client, message)
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch), but also tells the client when
    /// its request failed: `joinFailed` for joins, `error` otherwise.
    pub fn handle_event(
        &mut self,
        client: ClientId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        let target = event.target().to_string();
        let is_join = event.is_join();

        let result = self.dispatch(client, event);
        if let Err(e) = &result {
            tracing::debug!(%client, %target, error = %e, "client request failed");
            let reply = if is_join {
                ServerEvent::JoinFailed(JoinFailure {
                    room: target,
                    reason: e.to_string(),
                })
            } else {
                ServerEvent::Error {
                    message: e.to_string(),
                }
            };
            self.send_to(client, &reply);
        }
        result
    }
}
