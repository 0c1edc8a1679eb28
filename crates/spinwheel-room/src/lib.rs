//! Room lifecycle management for Spinwheel.
//!
//! All game state lives behind one [`RoomRegistry`]. The gateway calls its
//! async methods, gets back plain snapshots, and does all network I/O after
//! the registry lock has been released.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, routes joins/spins/disconnects,
//!   owns expiration timers
//! - [`Room`]: per-room membership and turn-order state machine
//! - [`WheelContent`]: the validated item and penalty lists
//! - [`ExpirationScheduler`]: cancellable delayed deletion of empty rooms
//! - [`RoomConfig`]: code length, expiration delay

mod code;
mod config;
mod content;
mod error;
mod expiry;
mod registry;
mod room;

pub use code::RoomCodeGenerator;
pub use config::RoomConfig;
pub use content::WheelContent;
pub use error::RoomError;
pub use expiry::{ExpirationId, ExpirationScheduler};
pub use registry::{DisconnectOutcome, JoinOutcome, LeftRoom, RoomRegistry, SpinOutcome};
pub use room::{Room, RoomSnapshot, SpinResult};
