//! Wire protocol for Spinwheel.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identifiers** ([`ConnectionId`], [`RoomCode`]) shared by every layer.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) and their payloads.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) to turn events into frames.
//! - **Errors** ([`ProtocolError`]) raised while encoding or decoding.
//!
//! Every frame is one JSON object, adjacently tagged:
//!
//! ```text
//! { "event": "spin_wheel", "data": { "roomCode": "042137" } }
//! ```
//!
//! The protocol layer knows nothing about sockets or rooms; it only knows the
//! shape of the messages.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ConnectionId, CreateRoom, ErrorReport, JoinRoom, Member,
    Presence, RoomCode, RoomView, ServerEvent, SpinWheel, WheelResult,
};
