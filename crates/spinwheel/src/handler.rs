//! Per-connection handler: event dispatch and delivery.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Issue a `ConnectionId` and register an outbox with the gateway
//!   2. Spawn a writer task that drains the outbox onto the socket
//!   3. Loop: receive frames → decode → dispatch to the room registry
//!   4. On exit, leave the seated room and tell the remaining members

use std::sync::Arc;

use spinwheel_protocol::{
    ClientEvent, Codec, ConnectionId, CreateRoom, JoinRoom, Presence, RoomCode, RoomView,
    ServerEvent, SpinWheel, WheelResult,
};
use spinwheel_room::{DisconnectOutcome, RoomError, RoomSnapshot};
use spinwheel_transport::{Connection, WebSocketConnection};

use crate::gateway::Outbox;
use crate::server::ServerState;

/// Drop guard that takes a connection out of its room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let room = state.gateway.unregister(conn_id).await;
            let outcome = state.registry.disconnect(conn_id, room.as_ref()).await;
            announce_departure(&state, outcome).await;
            tracing::debug!(%conn_id, "connection cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) {
    let conn = Arc::new(conn);
    let conn_id = state.next_connection_id();
    let socket_id = conn.id();
    tracing::info!(%conn_id, %socket_id, "client connected");

    let outbox = state.gateway.register(conn_id).await;
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbox,
        Arc::clone(&state),
        conn_id,
    ));

    loop {
        let frame = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, timeout = ?state.idle_timeout, "connection idle, closing");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client event");
                state
                    .gateway
                    .send_to(conn_id, ServerEvent::error(format!("invalid message: {e}")))
                    .await;
                continue;
            }
        };

        dispatch(&state, conn_id, event).await;
    }

    // _guard drops here → room departure fires.
}

/// Drains a connection's outbox onto its socket.
///
/// Ends when the gateway drops the sender (after unregister) or when the
/// socket stops accepting writes, then closes the socket.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut outbox: Outbox,
    state: Arc<ServerState<C>>,
    conn_id: ConnectionId,
) {
    while let Some(event) = outbox.recv().await {
        let frame = match state.codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode server event");
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send failed, writer stopping");
            break;
        }
    }
    let _ = conn.close().await;
}

async fn dispatch<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, event: ClientEvent) {
    match event {
        ClientEvent::CreateRoom(create) => create_room(state, conn_id, create).await,
        ClientEvent::JoinRoom(join) => join_room(state, conn_id, join).await,
        ClientEvent::SpinWheel(spin) => spin_wheel(state, conn_id, spin).await,
    }
}

async fn create_room<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, create: CreateRoom) {
    let CreateRoom {
        items,
        penalties,
        nickname,
    } = create;

    match state
        .registry
        .create_room(items, penalties, conn_id, nickname.clone())
        .await
    {
        Ok(snapshot) => {
            seat(state, conn_id, snapshot.code.clone()).await;
            let view = room_view(snapshot, conn_id, nickname);
            state
                .gateway
                .send_to(conn_id, ServerEvent::RoomCreated(view))
                .await;
        }
        Err(e) => report(state, conn_id, &e).await,
    }
}

async fn join_room<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, join: JoinRoom) {
    let JoinRoom {
        room_code,
        nickname,
        is_rejoin,
    } = join;

    let outcome = match state
        .registry
        .join_room(&room_code, conn_id, nickname, is_rejoin)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return report(state, conn_id, &e).await,
    };

    seat(state, conn_id, room_code).await;

    let snapshot = outcome.snapshot;
    let nickname = outcome.member.nickname;
    if outcome.announce {
        let presence = ServerEvent::UserJoined(Presence {
            members: snapshot.members.clone(),
            nickname: nickname.clone(),
            current_turn_conn_id: snapshot.current_turn,
        });
        state
            .gateway
            .broadcast(&snapshot.member_ids(), Some(conn_id), &presence)
            .await;
    }
    state
        .gateway
        .send_to(conn_id, ServerEvent::JoinedRoom(room_view(snapshot, conn_id, nickname)))
        .await;
}

async fn spin_wheel<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, spin: SpinWheel) {
    match state.registry.spin_wheel(&spin.room_code, conn_id).await {
        Ok(outcome) => {
            let result = ServerEvent::WheelResult(WheelResult {
                item: outcome.result.item,
                penalty: outcome.result.penalty,
                next_turn_conn_id: outcome.result.next_turn,
                spinner_conn_id: outcome.result.spinner,
            });
            state
                .gateway
                .broadcast(&outcome.recipients, None, &result)
                .await;
        }
        Err(e) => report(state, conn_id, &e).await,
    }
}

/// Records that `conn_id` now sits in `code`, leaving the room it sat in
/// before if that was a different one.
async fn seat<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, code: RoomCode) {
    let Some(previous) = state.gateway.set_room(conn_id, code.clone()).await else {
        return;
    };
    if previous == code {
        return;
    }
    tracing::debug!(%conn_id, from = %previous, to = %code, "switching rooms");
    let outcome = state.registry.disconnect(conn_id, Some(&previous)).await;
    announce_departure(state, outcome).await;
}

/// Tells the remaining members that someone left. An emptied room has
/// nobody to tell.
async fn announce_departure<C: Codec>(state: &ServerState<C>, outcome: DisconnectOutcome) {
    let DisconnectOutcome::Left(left) = outcome else {
        return;
    };
    let recipients: Vec<ConnectionId> = left.members.iter().map(|m| m.conn_id).collect();
    let presence = ServerEvent::UserLeft(Presence {
        members: left.members,
        nickname: left.member.nickname,
        current_turn_conn_id: left.current_turn,
    });
    state.gateway.broadcast(&recipients, None, &presence).await;
}

/// Sends a room error back to the connection that caused it.
async fn report<C: Codec>(state: &ServerState<C>, conn_id: ConnectionId, error: &RoomError) {
    tracing::debug!(%conn_id, %error, "request rejected");
    state
        .gateway
        .send_to(conn_id, ServerEvent::error(error.user_message()))
        .await;
}

fn room_view(snapshot: RoomSnapshot, self_conn_id: ConnectionId, nickname: String) -> RoomView {
    RoomView {
        room_code: snapshot.code,
        nickname,
        items: snapshot.items,
        penalties: snapshot.penalties,
        members: snapshot.members,
        current_turn_conn_id: snapshot.current_turn,
        self_conn_id,
    }
}

#[cfg(test)]
mod tests {
    use spinwheel_protocol::Member;

    use super::*;

    #[test]
    fn test_room_view_carries_viewer() {
        let snapshot = RoomSnapshot {
            code: RoomCode::from("123456"),
            items: vec!["A".into()],
            penalties: vec!["X".into()],
            members: vec![
                Member {
                    nickname: "Al".into(),
                    conn_id: ConnectionId(1),
                },
                Member {
                    nickname: "Bo".into(),
                    conn_id: ConnectionId(2),
                },
            ],
            current_turn: Some(ConnectionId(1)),
        };

        let view = room_view(snapshot, ConnectionId(2), "Bo".into());
        assert_eq!(view.room_code, RoomCode::from("123456"));
        assert_eq!(view.self_conn_id, ConnectionId(2));
        assert_eq!(view.nickname, "Bo");
        assert_eq!(view.current_turn_conn_id, Some(ConnectionId(1)));
        assert_eq!(view.members.len(), 2);
    }
}
