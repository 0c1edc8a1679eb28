//! Identifiers and events that travel on the wire.
//!
//! Field names are camelCase and event tags are snake_case, which is what
//! the browser client expects.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Game-level identity of one client connection.
///
/// Issued by the gateway when a socket is accepted. It is deliberately a
/// different type from the transport's socket id: the room layer only ever
/// sees `ConnectionId`, never a socket handle.
///
/// Serializes as a plain number (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A short, human-shareable room code such as `"042137"`.
///
/// The protocol layer does not validate the format: a client may send any
/// string, and an unknown code simply fails the registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room member as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub nickname: String,
    pub conn_id: ConnectionId,
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Payload of `create_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    /// Raw wheel items; blank entries are dropped by the room layer.
    pub items: Vec<String>,
    /// Raw penalties; blank entries are dropped by the room layer.
    pub penalties: Vec<String>,
    pub nickname: String,
}

/// Payload of `join_room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_code: RoomCode,
    pub nickname: String,
    /// `true` when the client is restoring a seat after a reconnect.
    /// Rejoins are not announced to the other members.
    #[serde(default)]
    pub is_rejoin: bool,
}

/// Payload of `spin_wheel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinWheel {
    pub room_code: RoomCode,
}

/// Every event a client may send.
///
/// Disconnects are not an event: the gateway infers them from the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    SpinWheel(SpinWheel),
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Full room state sent to a connection that just created or joined a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_code: RoomCode,
    /// Nickname of the receiving connection.
    pub nickname: String,
    pub items: Vec<String>,
    pub penalties: Vec<String>,
    pub members: Vec<Member>,
    pub current_turn_conn_id: Option<ConnectionId>,
    /// The receiving connection's own id, so the client can tell when it is
    /// its turn.
    pub self_conn_id: ConnectionId,
}

/// Membership change broadcast (`user_joined`, `user_left`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub members: Vec<Member>,
    /// Nickname of the member who arrived or left.
    pub nickname: String,
    pub current_turn_conn_id: Option<ConnectionId>,
}

/// Outcome of a spin, broadcast to the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelResult {
    pub item: String,
    pub penalty: String,
    pub next_turn_conn_id: ConnectionId,
    pub spinner_conn_id: ConnectionId,
}

/// A user-facing failure, sent only to the connection that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

/// Every event the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated(RoomView),
    JoinedRoom(RoomView),
    UserJoined(Presence),
    WheelResult(WheelResult),
    UserLeft(Presence),
    Error(ErrorReport),
}

impl ServerEvent {
    /// Shorthand for an [`ServerEvent::Error`] carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorReport {
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ConnectionId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "C-7");
    }

    #[test]
    fn test_room_code_keeps_leading_zeros() {
        let code = RoomCode::from("000731");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"000731\"");
        assert_eq!(code.to_string(), "000731");
    }

    #[test]
    fn test_member_field_names() {
        let member = Member {
            nickname: "Al".into(),
            conn_id: ConnectionId(3),
        };
        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value, json!({ "nickname": "Al", "connId": 3 }));
    }

    #[test]
    fn test_create_room_decodes_from_client_json() {
        let raw = json!({
            "event": "create_room",
            "data": {
                "items": ["A", " B "],
                "penalties": ["X"],
                "nickname": "Al"
            }
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateRoom(CreateRoom {
                items: vec!["A".into(), " B ".into()],
                penalties: vec!["X".into()],
                nickname: "Al".into(),
            })
        );
    }

    #[test]
    fn test_join_room_is_rejoin_defaults_to_false() {
        let raw = json!({
            "event": "join_room",
            "data": { "roomCode": "123456", "nickname": "Bo" }
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        match event {
            ClientEvent::JoinRoom(join) => {
                assert_eq!(join.room_code, RoomCode::from("123456"));
                assert!(!join.is_rejoin);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_join_room_reads_is_rejoin() {
        let raw = json!({
            "event": "join_room",
            "data": { "roomCode": "123456", "nickname": "Bo", "isRejoin": true }
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, ClientEvent::JoinRoom(JoinRoom { is_rejoin: true, .. })));
    }

    #[test]
    fn test_spin_wheel_decodes() {
        let raw = json!({ "event": "spin_wheel", "data": { "roomCode": "000001" } });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::SpinWheel(SpinWheel {
                room_code: RoomCode::from("000001"),
            })
        );
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let raw = json!({ "event": "steal_turn", "data": {} });
        let result: Result<ClientEvent, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_room_created_json_shape() {
        let event = ServerEvent::RoomCreated(RoomView {
            room_code: RoomCode::from("555123"),
            nickname: "Al".into(),
            items: vec!["A".into(), "B".into()],
            penalties: vec!["X".into()],
            members: vec![Member {
                nickname: "Al".into(),
                conn_id: ConnectionId(1),
            }],
            current_turn_conn_id: Some(ConnectionId(1)),
            self_conn_id: ConnectionId(1),
        });
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["event"], "room_created");
        assert_eq!(value["data"]["roomCode"], "555123");
        assert_eq!(value["data"]["currentTurnConnId"], 1);
        assert_eq!(value["data"]["selfConnId"], 1);
        assert_eq!(value["data"]["members"][0]["connId"], 1);
    }

    #[test]
    fn test_wheel_result_json_shape() {
        let event = ServerEvent::WheelResult(WheelResult {
            item: "A".into(),
            penalty: "X".into(),
            next_turn_conn_id: ConnectionId(2),
            spinner_conn_id: ConnectionId(1),
        });
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "event": "wheel_result",
                "data": {
                    "item": "A",
                    "penalty": "X",
                    "nextTurnConnId": 2,
                    "spinnerConnId": 1
                }
            })
        );
    }

    #[test]
    fn test_user_left_without_turn_holder_is_null() {
        let event = ServerEvent::UserLeft(Presence {
            members: vec![],
            nickname: "Al".into(),
            current_turn_conn_id: None,
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "user_left");
        assert!(value["data"]["currentTurnConnId"].is_null());
    }

    #[test]
    fn test_error_helper() {
        let value = serde_json::to_value(ServerEvent::error("not your turn")).unwrap();
        assert_eq!(value, json!({ "event": "error", "data": { "message": "not your turn" } }));
    }
}
