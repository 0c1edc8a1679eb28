//! # Spinwheel
//!
//! Real-time multiplayer "wheel of fortune" room server.
//!
//! Players connect over WebSocket, create or join a room by its six-digit
//! code, and take turns spinning a wheel that draws one item and one
//! penalty from the room's lists. Empty rooms linger for a grace period so
//! a player who reconnects can pick up where they left off.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spinwheel::prelude::*;
//!
//! # async fn start() -> Result<(), SpinwheelError> {
//! let server = SpinwheelServer::builder()
//!     .bind("0.0.0.0:5000")
//!     .build()
//!     .await?;
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await
//! # }
//! ```

mod error;
mod gateway;
mod handler;
pub mod logger;
mod server;

pub use error::SpinwheelError;
pub use gateway::{Gateway, Outbox};
pub use server::{DEFAULT_IDLE_TIMEOUT, SpinwheelServer, SpinwheelServerBuilder};

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{SpinwheelError, SpinwheelServer, SpinwheelServerBuilder};
    pub use spinwheel_protocol::{
        ClientEvent, Codec, ConnectionId, CreateRoom, ErrorReport, JoinRoom, JsonCodec, Member,
        Presence, RoomCode, RoomView, ServerEvent, SpinWheel, WheelResult,
    };
    pub use spinwheel_room::{RoomConfig, RoomError, RoomRegistry};
}
