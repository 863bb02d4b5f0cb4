//! Per-connection handler: outbound pump and event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Attach the endpoint to the hub → outbound queue
//!   2. Spawn a writer draining that queue into the socket
//!   3. Loop: receive frames → decode `ClientEvent` → registry
//!   4. On exit: leave every room, detach from the hub

use std::sync::Arc;

use parlor_protocol::{ClientEvent, ClientId, Codec, ServerEvent};
use parlor_transport::{Connection, Outbound, WebSocketConnection};

use crate::server::{ServerState, SharedRegistry};
use crate::ParlorError;

/// Drop guard that removes a client from the registry when its handler
/// exits, including on panic.
///
/// `Drop` is synchronous, so the cleanup runs in a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    client: ClientId,
    registry: SharedRegistry<C>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let client = self.client;
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let mut registry = registry.lock().await;
            let left = registry.disconnect_client(client);
            registry.transport_mut().detach(client.endpoint());
            tracing::info!(%client, rooms = left.len(), "client disconnected");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ParlorError> {
    let conn = Arc::new(conn);
    let client = ClientId::from(conn.id());

    let outbound = state
        .registry
        .lock()
        .await
        .transport_mut()
        .attach(client.endpoint());
    let _guard = ConnectionGuard {
        client,
        registry: Arc::clone(&state.registry),
    };
    tracing::info!(%client, peer = %conn.peer_addr(), "client connected");

    let writer = tokio::spawn(pump_outbound(Arc::clone(&conn), outbound, client));
    let result = read_events(&conn, &state, client).await;
    writer.abort();

    // _guard drops here → registry cleanup fires.
    result
}

/// Forwards queued frames to the socket until the queue closes or a send
/// fails.
async fn pump_outbound(
    conn: Arc<WebSocketConnection>,
    mut outbound: Outbound,
    client: ClientId,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%client, error = %e, "send failed, writer stopping");
            break;
        }
    }
}

/// Reads frames until the peer goes away.
async fn read_events<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    client: ClientId,
) -> Result<(), ParlorError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%client, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%client, error = %e, "failed to decode event");
                let reply = ServerEvent::Error {
                    message: format!("invalid event: {e}"),
                };
                state.registry.lock().await.send_to(client, &reply);
                continue;
            }
        };

        tracing::debug!(%client, target = event.target(), "event received");
        let mut registry = state.registry.lock().await;
        // The registry already told the client; this only keeps a trace.
        if let Err(e) = registry.handle_event(client, event) {
            tracing::trace!(%client, error = %e, "event not applied");
        }
    }
}
