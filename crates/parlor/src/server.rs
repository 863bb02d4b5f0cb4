//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a Parlor server. It ties the
//! layers together: transport → protocol → room registry.

use std::sync::Arc;

use parlor_protocol::{Codec, JsonCodec};
use parlor_room::{RegistryConfig, RoomFactory, RoomRegistry};
use parlor_transport::{Hub, Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::ParlorError;

/// A registry shared between the server's connection tasks and the
/// application.
///
/// Lock it to create rooms or push state from server-side code; every
/// change is broadcast before the lock is released.
pub type SharedRegistry<C = JsonCodec> = Arc<Mutex<RoomRegistry<Hub, C>>>;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: SharedRegistry<C>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn start() -> Result<(), ParlorError> {
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:8080")
///     .room_type("chat", factory(|_| PlainRoom))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    registry_config: RegistryConfig,
    room_types: Vec<(String, RoomFactory)>,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            registry_config: RegistryConfig::default(),
            room_types: Vec::new(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the registry configuration.
    pub fn registry_config(mut self, config: RegistryConfig) -> Self {
        self.registry_config = config;
        self
    }

    /// Registers a room type. Types are defined in the order given.
    pub fn room_type(mut self, name: impl Into<String>, factory: RoomFactory) -> Self {
        self.room_types.push((name.into(), factory));
        self
    }

    /// Defines the room types and binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ParlorServer, ParlorError> {
        let mut registry = RoomRegistry::with_codec(
            Hub::new(),
            JsonCodec,
            self.registry_config,
        );
        for (name, factory) in self.room_types {
            registry.define_room_type(name, factory)?;
        }

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listener bound");

        let state = Arc::new(ServerState {
            registry: Arc::new(Mutex::new(registry)),
            codec: JsonCodec,
        });

        Ok(ParlorServer { transport, state })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A Parlor server bound to its listener.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ParlorServer {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }
}

impl<C: Codec> ParlorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle on the room registry, usable while the server runs.
    pub fn registry(&self) -> SharedRegistry<C> {
        Arc::clone(&self.state.registry)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
