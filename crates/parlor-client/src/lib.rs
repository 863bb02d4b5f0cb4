//! WebSocket client for Parlor servers.
//!
//! [`ParlorClient`] speaks the same frames a browser client does: it sends
//! the control events (`joinOrCreateRoom`, `joinRoomById`, `leaveRoom`) and
//! room messages, and yields every [`ServerEvent`] the server pushes.
//!
//! The client remembers the room named by the last `joinedRoom` it read, so
//! [`send_message`](ParlorClient::send_message) only needs the payload.
//!
//! ```rust,no_run
//! use parlor_client::ParlorClient;
//! use parlor_protocol::ServerEvent;
//!
//! # async fn chat() -> Result<(), parlor_client::ClientError> {
//! let mut client = ParlorClient::connect("ws://127.0.0.1:8080").await?;
//! client.join_or_create_room("chat").await?;
//!
//! while let Some(event) = client.next_event().await? {
//!     if let ServerEvent::JoinedRoom(_) = event {
//!         client.send_message("hello").await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::ClientError;

use futures_util::stream::{self, SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt};
use parlor_protocol::{
    ClientEvent, Codec, JsonCodec, RoomId, RoomMessage, ServerEvent, StateSnapshot,
};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connection to a Parlor server.
pub struct ParlorClient {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    codec: JsonCodec,
    /// Room named by the last `joinedRoom`, until it is left.
    joined_room: Option<RoomId>,
}

impl ParlorClient {
    /// Opens a WebSocket connection to `url` (for example
    /// `ws://127.0.0.1:8080`).
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        let (sink, stream) = ws.split();
        tracing::debug!(%url, "connected to server");
        Ok(Self {
            sink,
            stream,
            codec: JsonCodec,
            joined_room: None,
        })
    }

    /// The room messages are sent to, if any.
    pub fn joined_room(&self) -> Option<&RoomId> {
        self.joined_room.as_ref()
    }

    /// Asks to join the oldest room of `room_type`, creating one if none
    /// exists. The answer arrives as `joinedRoom` or `joinFailed`.
    pub async fn join_or_create_room(&mut self, room_type: &str) -> Result<(), ClientError> {
        self.send_event(&ClientEvent::JoinOrCreateRoom(room_type.to_string()))
            .await
    }

    /// Asks to join a specific room.
    pub async fn join_room_by_id(
        &mut self,
        room_id: impl Into<RoomId>,
    ) -> Result<(), ClientError> {
        self.send_event(&ClientEvent::JoinRoomById(room_id.into())).await
    }

    /// Leaves a room. Leaving the joined room also stops `send_message`
    /// from targeting it.
    pub async fn leave_room(&mut self, room_id: impl Into<RoomId>) -> Result<(), ClientError> {
        let room_id = room_id.into();
        if self.joined_room.as_ref() == Some(&room_id) {
            self.joined_room = None;
        }
        self.send_event(&ClientEvent::LeaveRoom(room_id)).await
    }

    /// Sends an application message to the joined room.
    ///
    /// Fails with [`ClientError::NotInRoom`] without touching the socket if
    /// no room is joined.
    pub async fn send_message(&mut self, message: impl Into<Value>) -> Result<(), ClientError> {
        let Some(room_id) = self.joined_room.clone() else {
            tracing::debug!("message dropped, not joined in any room");
            return Err(ClientError::NotInRoom);
        };
        self.send_event(&ClientEvent::Message(RoomMessage {
            room_id,
            message: message.into(),
        }))
        .await
    }

    /// Sends any client event as one frame.
    pub async fn send_event(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let bytes = self.codec.encode(event)?;
        let frame = match String::from_utf8(bytes) {
            Ok(text) => Message::text(text),
            Err(e) => Message::binary(e.into_bytes()),
        };
        self.sink.send(frame).await?;
        Ok(())
    }

    /// Waits for the next event from the server.
    ///
    /// Returns `Ok(None)` once the server closes the connection. Control
    /// frames (ping, pong) are skipped.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        loop {
            let msg = match self.stream.next().await {
                Some(msg) => msg?,
                None => return Ok(None),
            };
            let data = match msg {
                Message::Text(_) | Message::Binary(_) => msg.into_data(),
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            let event: ServerEvent = self.codec.decode(&data)?;
            if let ServerEvent::JoinedRoom(view) = &event {
                self.joined_room = Some(view.id.clone());
            }
            return Ok(Some(event));
        }
    }

    /// Waits for the next `stateUpdated`, skipping other events, and
    /// returns the room's full state.
    pub async fn next_state_update(&mut self) -> Result<Option<StateSnapshot>, ClientError> {
        while let Some(event) = self.next_event().await? {
            if let ServerEvent::StateUpdated(state) = event {
                return Ok(Some(state));
            }
        }
        Ok(None)
    }

    /// The server's events as a stream. Ends when the connection closes.
    pub fn events(&mut self) -> impl Stream<Item = Result<ServerEvent, ClientError>> + '_ {
        stream::unfold(self, |client| async move {
            let item = client.next_event().await.transpose();
            item.map(|item| (item, client))
        })
    }

    /// Closes the connection.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.sink.close().await?;
        Ok(())
    }
}
