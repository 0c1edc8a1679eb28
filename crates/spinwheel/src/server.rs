//! `SpinwheelServer` builder and accept loop.
//!
//! This is the entry point for running a Spinwheel room server. It ties
//! together the layers: transport → protocol → gateway → room registry.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use spinwheel_protocol::{Codec, ConnectionId, JsonCodec};
use spinwheel_room::{RoomConfig, RoomRegistry};
use spinwheel_transport::{Transport, WebSocketTransport};

use crate::SpinwheelError;
use crate::gateway::Gateway;
use crate::handler::handle_connection;

/// Inbound silence after which a connection is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// and the gateway each guard their own state.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: RoomRegistry,
    pub(crate) gateway: Gateway,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    next_conn_id: AtomicU64,
}

impl<C: Codec> ServerState<C> {
    /// Issues a fresh game-level id for an accepted socket.
    pub(crate) fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_conn_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// Builder for configuring and starting a Spinwheel server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use spinwheel::prelude::*;
///
/// # async fn start() -> Result<(), SpinwheelError> {
/// let server = SpinwheelServer::builder()
///     .bind("0.0.0.0:5000")
///     .room_config(RoomConfig::with_expiration_delay(Duration::from_secs(600)))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SpinwheelServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Duration,
    seed: Option<u64>,
}

impl SpinwheelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            room_config: RoomConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            seed: None,
        }
    }

    /// Sets the address to bind the server to. Port 0 picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration (code length, expiration delay).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how long a connection may stay silent before it is closed.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Seeds the room code and spin RNG, for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SpinwheelServer<JsonCodec>, SpinwheelError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = match self.seed {
            Some(seed) => RoomRegistry::with_seed(self.room_config, seed),
            None => RoomRegistry::new(self.room_config),
        };

        let state = Arc::new(ServerState {
            registry,
            gateway: Gateway::new(),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            next_conn_id: AtomicU64::new(1),
        });

        Ok(SpinwheelServer { transport, state })
    }
}

impl Default for SpinwheelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Spinwheel server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct SpinwheelServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SpinwheelServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SpinwheelServerBuilder {
        SpinwheelServerBuilder::new()
    }
}

impl<C: Codec> SpinwheelServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the room registry, shared with the running server.
    pub fn registry(&self) -> RoomRegistry {
        self.state.registry.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), SpinwheelError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each accepted socket gets its own handler task. On shutdown the
    /// listener is dropped and every pending room expiration is cancelled;
    /// handler tasks that are still running end with the runtime.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), SpinwheelError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = %self.local_addr()?, "spinwheel server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting");
                    break;
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(handle_connection(conn, state));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.state.registry.shutdown().await;
        tracing::info!("spinwheel server stopped");
        Ok(())
    }
}
