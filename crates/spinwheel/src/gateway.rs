//! Connection directory: who is connected, where to deliver their events,
//! and which room each connection is seated in.

use std::collections::HashMap;

use spinwheel_protocol::{ConnectionId, RoomCode, ServerEvent};
use tokio::sync::{Mutex, mpsc};

/// Receiving half handed to a connection's writer task.
pub type Outbox = mpsc::UnboundedReceiver<ServerEvent>;

#[derive(Debug)]
struct Peer {
    sender: mpsc::UnboundedSender<ServerEvent>,
    room: Option<RoomCode>,
}

/// Routes outbound events to connections.
///
/// Delivery only pushes onto a per-connection unbounded channel; the socket
/// write happens in that connection's writer task. A slow client therefore
/// never blocks a broadcast, and the directory lock is never held across
/// network I/O.
#[derive(Debug, Default)]
pub struct Gateway {
    peers: Mutex<HashMap<ConnectionId, Peer>>,
}

impl Gateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns the receiver its writer task drains.
    pub async fn register(&self, conn_id: ConnectionId) -> Outbox {
        let (sender, outbox) = mpsc::unbounded_channel();
        self.peers
            .lock()
            .await
            .insert(conn_id, Peer { sender, room: None });
        outbox
    }

    /// Removes a connection. Returns the room it was seated in.
    ///
    /// Dropping the sender ends the writer task once it has flushed what was
    /// already queued.
    pub async fn unregister(&self, conn_id: ConnectionId) -> Option<RoomCode> {
        self.peers
            .lock()
            .await
            .remove(&conn_id)
            .and_then(|peer| peer.room)
    }

    /// Records the room `conn_id` is now seated in. Returns the previous one.
    pub async fn set_room(&self, conn_id: ConnectionId, room: RoomCode) -> Option<RoomCode> {
        let mut peers = self.peers.lock().await;
        let peer = peers.get_mut(&conn_id)?;
        peer.room.replace(room)
    }

    pub async fn room_of(&self, conn_id: ConnectionId) -> Option<RoomCode> {
        self.peers
            .lock()
            .await
            .get(&conn_id)
            .and_then(|peer| peer.room.clone())
    }

    /// Queues `event` for one connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) -> bool {
        let peers = self.peers.lock().await;
        match peers.get(&conn_id) {
            Some(peer) => peer.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Queues `event` for every listed connection except `except`.
    ///
    /// Connections that have already gone away are skipped. Returns the
    /// number of connections the event was queued for.
    pub async fn broadcast(
        &self,
        recipients: &[ConnectionId],
        except: Option<ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        let peers = self.peers.lock().await;
        let mut queued = 0;
        for id in recipients.iter().filter(|id| Some(**id) != except) {
            let Some(peer) = peers.get(id) else {
                continue;
            };
            if peer.sender.send(event.clone()).is_ok() {
                queued += 1;
            }
        }
        queued
    }

    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId(id)
    }

    #[tokio::test]
    async fn test_send_to_registered_peer() {
        let gateway = Gateway::new();
        let mut outbox = gateway.register(cid(1)).await;

        assert!(gateway.send_to(cid(1), ServerEvent::error("hi")).await);
        assert_eq!(outbox.recv().await, Some(ServerEvent::error("hi")));
    }

    #[tokio::test]
    async fn test_send_to_unknown_peer_fails() {
        let gateway = Gateway::new();
        assert!(!gateway.send_to(cid(9), ServerEvent::error("hi")).await);
    }

    #[tokio::test]
    async fn test_broadcast_skips_excluded_and_missing() {
        let gateway = Gateway::new();
        let mut one = gateway.register(cid(1)).await;
        let mut two = gateway.register(cid(2)).await;

        let event = ServerEvent::error("x");
        let sent = gateway
            .broadcast(&[cid(1), cid(2), cid(3)], Some(cid(1)), &event)
            .await;

        assert_eq!(sent, 1);
        assert_eq!(two.recv().await, Some(event));
        assert!(one.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_room_tracking() {
        let gateway = Gateway::new();
        let _outbox = gateway.register(cid(1)).await;

        assert_eq!(gateway.room_of(cid(1)).await, None);
        assert_eq!(gateway.set_room(cid(1), RoomCode::from("111111")).await, None);
        assert_eq!(
            gateway.set_room(cid(1), RoomCode::from("222222")).await,
            Some(RoomCode::from("111111"))
        );
        assert_eq!(gateway.room_of(cid(1)).await, Some(RoomCode::from("222222")));
        assert_eq!(gateway.unregister(cid(1)).await, Some(RoomCode::from("222222")));
        assert!(gateway.is_empty().await);
    }

    #[tokio::test]
    async fn test_unregister_closes_outbox() {
        let gateway = Gateway::new();
        let mut outbox = gateway.register(cid(1)).await;
        gateway.send_to(cid(1), ServerEvent::error("last")).await;
        gateway.unregister(cid(1)).await;

        assert_eq!(outbox.recv().await, Some(ServerEvent::error("last")));
        assert_eq!(outbox.recv().await, None);
    }

    #[tokio::test]
    async fn test_set_room_for_unknown_peer_is_ignored() {
        let gateway = Gateway::new();
        assert_eq!(gateway.set_room(cid(5), RoomCode::from("000000")).await, None);
        assert_eq!(gateway.len().await, 0);
    }
}
