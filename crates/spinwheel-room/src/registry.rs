//! The room registry: single owner of every room and expiration timer.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use rand::SeedableRng;
use rand::rngs::StdRng;
use spinwheel_protocol::{ConnectionId, Member, RoomCode};
use tokio::sync::Mutex;

use crate::{
    ExpirationId, ExpirationScheduler, Room, RoomCodeGenerator, RoomConfig, RoomError,
    RoomSnapshot, SpinResult, WheelContent,
};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Room state right after the join.
    pub snapshot: RoomSnapshot,
    /// The member entry that was written.
    pub member: Member,
    /// `true` for a first-time join, which the other members are told about.
    /// Rejoins are silent.
    pub announce: bool,
}

/// Result of a successful spin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinOutcome {
    pub result: SpinResult,
    /// Everyone in the room, spinner included.
    pub recipients: Vec<ConnectionId>,
}

/// A member left a room that still has people in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftRoom {
    pub code: RoomCode,
    /// The member who left.
    pub member: Member,
    /// Who is still there.
    pub members: Vec<Member>,
    pub current_turn: Option<ConnectionId>,
}

/// What a disconnect did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// No room code, unknown room, or not a member: nothing changed.
    NoOp,
    /// The member left; the rest of the room should be told.
    Left(LeftRoom),
    /// The last member left and the room is now scheduled for deletion.
    /// Nobody is left to notify.
    Emptied { code: RoomCode, member: Member },
}

/// Everything behind the registry lock.
struct RegistryState {
    rooms: HashMap<RoomCode, Room>,
    expirations: ExpirationScheduler,
    codes: RoomCodeGenerator,
    rng: StdRng,
}

impl RegistryState {
    /// Fire handler body: delete `code` if `id` is still its live timer and
    /// the room is still empty.
    fn expire(&mut self, code: &RoomCode, id: ExpirationId) -> bool {
        if !self.expirations.complete(code, id) {
            tracing::debug!(room_code = %code, %id, "stale expiration ignored");
            return false;
        }
        match self.rooms.get(code) {
            Some(room) if room.is_empty() => {
                self.rooms.remove(code);
                tracing::info!(room_code = %code, "empty room expired and deleted");
                true
            }
            Some(_) => {
                tracing::debug!(room_code = %code, "room has members again, kept");
                false
            }
            None => false,
        }
    }
}

/// Owns the room map and the pending expirations.
///
/// Cheap to clone; clones share the same state. Every operation runs as a
/// single critical section on one `tokio::sync::Mutex` and never awaits
/// anything but the lock itself, so operations are atomic with respect to
/// each other and to expiration timers. Results come back as owned
/// snapshots for the caller to broadcast after the lock is gone.
#[derive(Clone)]
pub struct RoomRegistry {
    state: Arc<Mutex<RegistryState>>,
    config: Arc<RoomConfig>,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS random source.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an empty registry with a fixed seed, for reproducible codes
    /// and spins.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, rng: StdRng) -> Self {
        let state = RegistryState {
            rooms: HashMap::new(),
            expirations: ExpirationScheduler::new(),
            codes: RoomCodeGenerator::from_config(&config),
            rng,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room with `founder` as its only member and turn holder.
    ///
    /// The content lists are validated before the lock is taken. The code is
    /// generated and the room inserted in one critical section.
    ///
    /// # Errors
    /// - [`RoomError::InvalidConfiguration`] if either list is blank
    /// - [`RoomError::CodeSpaceExhausted`] if no free code was found
    pub async fn create_room(
        &self,
        items: Vec<String>,
        penalties: Vec<String>,
        founder: ConnectionId,
        nickname: String,
    ) -> Result<RoomSnapshot, RoomError> {
        let content = WheelContent::new(items, penalties)?;
        let founder_id = founder;
        let founder = Member {
            nickname,
            conn_id: founder_id,
        };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let code = state
            .codes
            .generate(&mut state.rng, |code| state.rooms.contains_key(code))?;
        // Fresh codes have no timer; this only matters if a deleted room's
        // code is handed out again while a stale timer is still registered.
        state.expirations.cancel(&code);

        let room = Room::new(code.clone(), content, founder);
        let snapshot = room.snapshot();
        state.rooms.insert(code.clone(), room);

        tracing::info!(
            room_code = %code,
            founder = %founder_id,
            rooms = state.rooms.len(),
            "room created"
        );
        Ok(snapshot)
    }

    /// Adds `conn_id` to a room, or refreshes its entry.
    ///
    /// Cancels a pending expiration, so a player who comes back to an empty
    /// room within the delay window keeps it alive. `is_rejoin` only decides
    /// whether the join is announced.
    ///
    /// # Errors
    /// [`RoomError::RoomNotFound`] if no room has this code.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        conn_id: ConnectionId,
        nickname: String,
        is_rejoin: bool,
    ) -> Result<JoinOutcome, RoomError> {
        let member = Member { nickname, conn_id };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let room = state
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        if state.expirations.cancel(code) {
            tracing::info!(room_code = %code, %conn_id, "room revived, expiration cancelled");
        }

        let seated = room.join(member.clone());
        tracing::info!(
            room_code = %code,
            %conn_id,
            nickname = %member.nickname,
            is_rejoin,
            seated,
            members = room.len(),
            "member joined"
        );

        Ok(JoinOutcome {
            snapshot: room.snapshot(),
            member,
            announce: !is_rejoin,
        })
    }

    /// Spins the wheel for `conn_id` if it holds the turn.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`] if no room has this code
    /// - [`RoomError::NotYourTurn`] if `conn_id` is not the turn holder;
    ///   nothing changes
    pub async fn spin_wheel(
        &self,
        code: &RoomCode,
        conn_id: ConnectionId,
    ) -> Result<SpinOutcome, RoomError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let room = state
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        let result = room.spin(conn_id, &mut state.rng)?;

        tracing::info!(
            room_code = %code,
            spinner = %result.spinner,
            next_turn = %result.next_turn,
            item = %result.item,
            penalty = %result.penalty,
            "wheel spun"
        );

        Ok(SpinOutcome {
            result,
            recipients: room.member_ids(),
        })
    }

    /// Removes `conn_id` from the room it was seated in.
    ///
    /// When the room becomes empty it is not deleted here: an expiration is
    /// armed instead, and the room survives if anyone joins before it fires.
    pub async fn disconnect(
        &self,
        conn_id: ConnectionId,
        code: Option<&RoomCode>,
    ) -> DisconnectOutcome {
        let Some(code) = code else {
            return DisconnectOutcome::NoOp;
        };

        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let Some(room) = state.rooms.get_mut(code) else {
            return DisconnectOutcome::NoOp;
        };
        let Some(member) = room.remove(conn_id) else {
            return DisconnectOutcome::NoOp;
        };

        if !room.is_empty() {
            tracing::info!(
                room_code = %code,
                %conn_id,
                nickname = %member.nickname,
                members = room.len(),
                "member left"
            );
            return DisconnectOutcome::Left(LeftRoom {
                code: code.clone(),
                member,
                members: room.members(),
                current_turn: room.current_turn(),
            });
        }

        let delay = self.config.expiration_delay;
        let registry = Arc::downgrade(&self.state);
        let fire_code = code.clone();
        state
            .expirations
            .schedule(code.clone(), delay, move |id| expire(registry, fire_code, id));
        tracing::info!(room_code = %code, %conn_id, ?delay, "room empty, deletion scheduled");

        DisconnectOutcome::Emptied {
            code: code.clone(),
            member,
        }
    }

    /// Current state of a room, if it exists.
    pub async fn snapshot(&self, code: &RoomCode) -> Option<RoomSnapshot> {
        self.state.lock().await.rooms.get(code).map(Room::snapshot)
    }

    /// Runs `f` against a room under the lock. Meant for diagnostics and
    /// tests; `f` must not block.
    pub async fn inspect<T>(&self, code: &RoomCode, f: impl FnOnce(&Room) -> T) -> Option<T> {
        self.state.lock().await.rooms.get(code).map(f)
    }

    pub async fn contains(&self, code: &RoomCode) -> bool {
        self.state.lock().await.rooms.contains_key(code)
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    pub async fn has_pending_expiration(&self, code: &RoomCode) -> bool {
        self.state.lock().await.expirations.is_pending(code)
    }

    /// Cancels every pending expiration and drops all rooms.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let timers = state.expirations.cancel_all();
        let rooms = state.rooms.len();
        state.rooms.clear();
        tracing::info!(rooms, timers, "room registry shut down");
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

/// Timer callback. Holds only a weak reference so pending timers do not keep
/// a dropped registry alive.
async fn expire(registry: Weak<Mutex<RegistryState>>, code: RoomCode, id: ExpirationId) {
    let Some(state) = registry.upgrade() else {
        return;
    };
    state.lock().await.expire(&code, id);
}
