//! Unified error type for the Spinwheel server.

use spinwheel_protocol::ProtocolError;
use spinwheel_room::RoomError;
use spinwheel_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert errors from
/// the layer crates without any mapping at the call site.
#[derive(Debug, thiserror::Error)]
pub enum SpinwheelError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, wrong turn, bad content).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An I/O error outside the transport, e.g. reading the local address.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use spinwheel_protocol::{ConnectionId, RoomCode};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let spinwheel_err: SpinwheelError = err.into();
        assert!(matches!(spinwheel_err, SpinwheelError::Transport(_)));
        assert!(spinwheel_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let spinwheel_err: SpinwheelError = err.into();
        assert!(matches!(spinwheel_err, SpinwheelError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::RoomNotFound(RoomCode::from("123456"));
        let spinwheel_err: SpinwheelError = err.into();
        assert!(matches!(spinwheel_err, SpinwheelError::Room(_)));
        assert!(spinwheel_err.to_string().contains("123456"));
    }

    #[test]
    fn test_room_error_is_transparent() {
        let spinwheel_err: SpinwheelError = RoomError::NotYourTurn(ConnectionId(4)).into();
        assert_eq!(
            spinwheel_err.to_string(),
            RoomError::NotYourTurn(ConnectionId(4)).to_string()
        );
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no addr");
        let spinwheel_err: SpinwheelError = err.into();
        assert!(matches!(spinwheel_err, SpinwheelError::Io(_)));
    }
}
