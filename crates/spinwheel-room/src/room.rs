//! Per-room membership and turn-order state machine.
//!
//! A `Room` is plain data with synchronous methods. It never locks, sleeps,
//! or talks to the network; the registry serializes access to it.

use std::collections::HashMap;

use rand::Rng;
use spinwheel_protocol::{ConnectionId, Member, RoomCode};

use crate::{RoomError, WheelContent};

/// What a successful spin produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinResult {
    pub item: String,
    pub penalty: String,
    /// The connection that spun.
    pub spinner: ConnectionId,
    /// The connection whose turn it is now.
    pub next_turn: ConnectionId,
}

/// A copy of a room's visible state, taken under the registry lock and safe
/// to use after it has been released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub items: Vec<String>,
    pub penalties: Vec<String>,
    /// Members ordered by connection id.
    pub members: Vec<Member>,
    /// `None` only while the room is empty and awaiting expiration.
    pub current_turn: Option<ConnectionId>,
}

impl RoomSnapshot {
    /// Connection ids of every member, for broadcasting.
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.conn_id).collect()
    }
}

/// One game session.
///
/// Invariants, upheld by every public method:
/// - `turn_order` has no duplicates and holds exactly the keys of `members`;
/// - `current_turn < turn_order.len()` whenever `turn_order` is non-empty;
/// - `content` never changes after construction.
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    content: WheelContent,
    members: HashMap<ConnectionId, Member>,
    turn_order: Vec<ConnectionId>,
    current_turn: usize,
}

impl Room {
    /// Creates a room whose only member, and turn holder, is `founder`.
    pub fn new(code: RoomCode, content: WheelContent, founder: Member) -> Self {
        let founder_id = founder.conn_id;
        Self {
            code,
            content,
            members: HashMap::from([(founder_id, founder)]),
            turn_order: vec![founder_id],
            current_turn: 0,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn content(&self) -> &WheelContent {
        &self.content
    }

    pub fn member(&self, conn_id: &ConnectionId) -> Option<&Member> {
        self.members.get(conn_id)
    }

    /// Members ordered by connection id, which follows connection age.
    pub fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self.members.values().cloned().collect();
        members.sort_by_key(|m| m.conn_id);
        members
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.members.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn turn_order(&self) -> &[ConnectionId] {
        &self.turn_order
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn
    }

    /// The connection allowed to spin next.
    pub fn current_turn(&self) -> Option<ConnectionId> {
        self.turn_order.get(self.current_turn).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turn_order.is_empty()
    }

    /// Adds or refreshes a member.
    ///
    /// The member entry is always overwritten (a rejoin may bring a new
    /// nickname). A turn slot is appended only if the connection has none,
    /// so repeated joins never duplicate it. Returns `true` if a slot was
    /// appended.
    pub fn join(&mut self, member: Member) -> bool {
        let conn_id = member.conn_id;
        self.members.insert(conn_id, member);
        if self.turn_order.contains(&conn_id) {
            false
        } else {
            self.turn_order.push(conn_id);
            true
        }
    }

    /// Spins the wheel for `conn_id` and passes the turn on.
    ///
    /// # Errors
    /// [`RoomError::NotYourTurn`] if `conn_id` is not the current turn
    /// holder; the room is left untouched.
    pub fn spin<R: Rng + ?Sized>(
        &mut self,
        conn_id: ConnectionId,
        rng: &mut R,
    ) -> Result<SpinResult, RoomError> {
        if self.current_turn() != Some(conn_id) {
            return Err(RoomError::NotYourTurn(conn_id));
        }

        let (item, penalty) = self.content.draw(rng);
        self.current_turn = (self.current_turn + 1) % self.turn_order.len();
        let next_turn = self.turn_order[self.current_turn];

        Ok(SpinResult {
            item,
            penalty,
            spinner: conn_id,
            next_turn,
        })
    }

    /// Removes a member and its turn slot, keeping the turn pointer sane.
    ///
    /// Index policy, applied in order:
    /// 1. a slot removed before the current one shifts the pointer down by
    ///    one, so the same player keeps the turn;
    /// 2. a pointer that now runs past the end wraps to 0;
    /// 3. otherwise the pointer stays, which hands the turn to the next
    ///    player when the current holder left from the middle.
    ///
    /// Returns the removed member, or `None` if `conn_id` was not a member.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<Member> {
        let member = self.members.remove(&conn_id)?;

        if let Some(removed) = self.turn_order.iter().position(|id| *id == conn_id) {
            self.turn_order.remove(removed);
            if removed < self.current_turn {
                self.current_turn -= 1;
            }
            if self.current_turn >= self.turn_order.len() {
                self.current_turn = 0;
            }
        }

        Some(member)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            items: self.content.items().to_vec(),
            penalties: self.content.penalties().to_vec(),
            members: self.members(),
            current_turn: self.current_turn(),
        }
    }

    /// Checks the membership and turn invariants. Used by tests.
    pub fn is_consistent(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        let unique = self.turn_order.iter().all(|id| seen.insert(*id));
        let same_keys = self.turn_order.len() == self.members.len()
            && self.turn_order.iter().all(|id| self.members.contains_key(id));
        let index_ok = self.turn_order.is_empty() || self.current_turn < self.turn_order.len();
        unique && same_keys && index_ok
    }
}
