//! Error types for the room layer.

use spinwheel_protocol::{ConnectionId, RoomCode};

/// Errors returned by registry operations.
///
/// All of these are reported back to the connection that caused them; none
/// of them leave a room partially modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No active room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// A spin was attempted by a connection that does not hold the turn.
    #[error("it is not {0}'s turn")]
    NotYourTurn(ConnectionId),

    /// The item or penalty list was empty after trimming.
    #[error("invalid room configuration: {0}")]
    InvalidConfiguration(String),

    /// No free room code was found within the configured attempts.
    #[error("no free room code available")]
    CodeSpaceExhausted,
}

impl RoomError {
    /// Short message suitable for showing to a player.
    pub fn user_message(&self) -> String {
        match self {
            Self::RoomNotFound(_) => "room not found".to_string(),
            Self::NotYourTurn(_) => "it is not your turn".to_string(),
            Self::InvalidConfiguration(reason) => reason.clone(),
            Self::CodeSpaceExhausted => "no room available, try again later".to_string(),
        }
    }
}
