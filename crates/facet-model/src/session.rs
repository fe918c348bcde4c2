//! The session document: players, kinematics, projectiles, lifecycle.

use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

use facet_geometry::{Cell, GridDir, Vec2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant.
///
/// Newtype over `u64` so a player id can never be confused with a
/// session id. `#[serde(transparent)]` keeps the JSON representation a
/// plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a session (one game instance).
///
/// A session and its lobby entry share the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// What the identity provider hands us: a stable opaque id and a
/// display name. The core never reads anything else about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: PlayerId,
    pub name: String,
}

impl Identity {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// There is exactly one transition path:
///
/// ```text
/// Waiting → Active → Finished
/// SinglePlayer ─────→ Finished   (skips the waiting step)
/// ```
///
/// Once `Finished`, the status is immutable and the tick loop must stop
/// acting on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Waiting,
    Active,
    SinglePlayer,
    Finished,
}

impl SessionStatus {
    /// True when the session is accepting a second player.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// True when the tick loop should be driving this session.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Active | Self::SinglePlayer)
    }

    /// True when the session can be watched by a spectator.
    pub fn is_spectatable(&self) -> bool {
        self.is_running()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::SinglePlayer => write!(f, "single-player"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// The outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Winner {
    Player(PlayerId),
    Draw,
}

/// Errors raised by session document invariants.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An operation assumed a participant that the session doesn't have.
    #[error("player {0} is not part of session {1}")]
    UnknownPlayer(PlayerId, SessionId),

    /// A status transition outside the single legal path.
    #[error("illegal status transition {from} → {to}")]
    IllegalTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

// ---------------------------------------------------------------------------
// Per-player state
// ---------------------------------------------------------------------------

/// Variant-specific shape descriptor for a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Kinematics {
    /// Contiguous body segments, leading segment first, plus the
    /// current unit direction of travel.
    Snake { body: Vec<Cell>, dir: GridDir },

    /// A single point with a screen-space heading.
    Tank { pos: Vec2, heading: f64 },
}

/// Everything the session knows about one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    /// Display color, CSS hex string.
    pub color: String,
    pub score: u32,
    pub kinematics: Kinematics,
}

/// A live projectile. Removal is driven only by bounds-exit or
/// collision — a departed owner does not cascade-delete its shots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: PlayerId,
}

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// Held movement controls for the tank variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TankControls {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// A participant's most recently expressed desired action.
///
/// Participants only ever write their own entry in
/// [`Session::intents`]; the host is the only writer of simulation
/// fields. That single-writer split is what keeps concurrent updates
/// convergent without locks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlayerIntent {
    /// Desired grid direction (snake).
    Steer { dir: GridDir },

    /// Held controls plus a monotonically increasing fire counter
    /// (tank). Each counter increment is one discrete shot; the host
    /// tracks the last count it has applied.
    Drive {
        controls: TankControls,
        fire_count: u64,
    },
}

// ---------------------------------------------------------------------------
// Host lease
// ---------------------------------------------------------------------------

/// The lease that makes exactly one participant the tick-loop driver.
///
/// The holder renews the lease with every tick write. When a
/// participant observes an expired lease it may claim it — the
/// deterministic successor is the next participant by join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLease {
    pub holder: PlayerId,
    /// Milliseconds since the Unix epoch.
    pub expires_at_ms: u64,
}

impl HostLease {
    /// How long a lease lives without renewal. Renewal happens on every
    /// tick write, so expiry means the host stopped ticking.
    pub const TTL: std::time::Duration = std::time::Duration::from_secs(5);

    pub fn new(holder: PlayerId, expires_at_ms: u64) -> Self {
        Self {
            holder,
            expires_at_ms,
        }
    }

    /// A fresh lease for `holder`, valid for [`Self::TTL`] from `now`.
    pub fn granted_to(holder: PlayerId, now: SystemTime) -> Self {
        Self::new(holder, unix_millis(now) + Self::TTL.as_millis() as u64)
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for clocks
/// set before 1970.
pub fn unix_millis(t: SystemTime) -> u64 {
    t.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// The session document
// ---------------------------------------------------------------------------

/// One game instance: the single shared mutable record of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Participant ids in insertion order. Element 0 is the first
    /// joiner and the initial host.
    pub players: Vec<PlayerId>,

    /// Per-participant state. A player id in `players` always has an
    /// entry here once its join completes, never before.
    pub player_states: HashMap<PlayerId, PlayerState>,

    /// Published intents, one slot per participant.
    pub intents: HashMap<PlayerId, PlayerIntent>,

    pub projectiles: Vec<Projectile>,

    pub status: SessionStatus,
    pub winner: Option<Winner>,

    /// The food cell, present only in the snake variant.
    pub food: Option<Cell>,

    pub host_lease: HostLease,
    pub created_at: SystemTime,
}

impl Session {
    /// A fresh session with a single creator participant.
    pub fn new(
        id: SessionId,
        creator: PlayerId,
        creator_state: PlayerState,
        status: SessionStatus,
        food: Option<Cell>,
        lease: HostLease,
    ) -> Self {
        Self {
            id,
            players: vec![creator],
            player_states: HashMap::from([(creator, creator_state)]),
            intents: HashMap::new(),
            projectiles: Vec::new(),
            status,
            winner: None,
            food,
            host_lease: lease,
            created_at: SystemTime::now(),
        }
    }

    /// The participant currently responsible for the tick loop.
    pub fn host(&self) -> PlayerId {
        self.host_lease.holder
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        self.player_states.contains_key(&id)
    }

    /// The opponent of `id`, if the session has one.
    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        self.players.iter().copied().find(|p| *p != id)
    }

    /// The deterministic lease successor: the next participant by join
    /// order after `holder`, wrapping around.
    pub fn lease_successor(&self, holder: PlayerId) -> Option<PlayerId> {
        if self.players.len() < 2 {
            return None;
        }
        let idx = self.players.iter().position(|p| *p == holder)?;
        let next = (idx + 1) % self.players.len();
        Some(self.players[next])
    }

    /// Marks the session finished with the given outcome.
    ///
    /// A finished session is immutable: finishing twice is an illegal
    /// transition, as is finishing from `Waiting`.
    pub fn finish(&mut self, winner: Winner) -> Result<(), SessionError> {
        if !self.status.is_running() {
            return Err(SessionError::IllegalTransition {
                from: self.status,
                to: SessionStatus::Finished,
            });
        }
        self.status = SessionStatus::Finished;
        self.winner = Some(winner);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state(kin: Kinematics) -> PlayerState {
        PlayerState {
            name: "p".into(),
            color: "#8be9fd".into(),
            score: 0,
            kinematics: kin,
        }
    }

    fn snake_state() -> PlayerState {
        state(Kinematics::Snake {
            body: vec![Cell::new(5, 5)],
            dir: GridDir::RIGHT,
        })
    }

    fn waiting_session() -> Session {
        Session::new(
            SessionId(1),
            PlayerId(10),
            snake_state(),
            SessionStatus::Waiting,
            Some(Cell::new(15, 15)),
            HostLease::new(PlayerId(10), 0),
        )
    }

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&SessionId(7)).unwrap(), "7");
    }

    #[test]
    fn test_status_json_uses_kebab_case() {
        // The original documents stored "single-player" as a plain string;
        // the serde shape must match.
        let json = serde_json::to_string(&SessionStatus::SinglePlayer).unwrap();
        assert_eq!(json, "\"single-player\"");
    }

    #[test]
    fn test_status_predicates() {
        assert!(SessionStatus::Waiting.is_joinable());
        assert!(!SessionStatus::Active.is_joinable());
        assert!(SessionStatus::Active.is_running());
        assert!(SessionStatus::SinglePlayer.is_running());
        assert!(!SessionStatus::Finished.is_running());
        assert!(SessionStatus::Active.is_spectatable());
        assert!(!SessionStatus::Waiting.is_spectatable());
    }

    #[test]
    fn test_new_session_has_creator_state() {
        let s = waiting_session();
        assert_eq!(s.players, vec![PlayerId(10)]);
        assert!(s.has_player(PlayerId(10)));
        assert!(!s.has_player(PlayerId(11)));
        assert_eq!(s.host(), PlayerId(10));
    }

    #[test]
    fn test_finish_from_active() {
        let mut s = waiting_session();
        s.status = SessionStatus::Active;
        s.finish(Winner::Player(PlayerId(10))).unwrap();
        assert_eq!(s.status, SessionStatus::Finished);
        assert_eq!(s.winner, Some(Winner::Player(PlayerId(10))));
    }

    #[test]
    fn test_finish_twice_is_illegal() {
        let mut s = waiting_session();
        s.status = SessionStatus::SinglePlayer;
        s.finish(Winner::Draw).unwrap();
        assert!(s.finish(Winner::Draw).is_err());
    }

    #[test]
    fn test_finish_from_waiting_is_illegal() {
        let mut s = waiting_session();
        assert!(s.finish(Winner::Draw).is_err());
    }

    #[test]
    fn test_opponent_of() {
        let mut s = waiting_session();
        s.players.push(PlayerId(20));
        assert_eq!(s.opponent_of(PlayerId(10)), Some(PlayerId(20)));
        assert_eq!(s.opponent_of(PlayerId(20)), Some(PlayerId(10)));
    }

    #[test]
    fn test_lease_successor_wraps_by_join_order() {
        let mut s = waiting_session();
        s.players.push(PlayerId(20));
        assert_eq!(s.lease_successor(PlayerId(10)), Some(PlayerId(20)));
        assert_eq!(s.lease_successor(PlayerId(20)), Some(PlayerId(10)));
        // A single participant has no successor.
        let solo = waiting_session();
        assert_eq!(solo.lease_successor(PlayerId(10)), None);
    }

    #[test]
    fn test_lease_expiry() {
        let lease = HostLease::new(PlayerId(1), 1_000);
        assert!(!lease.is_expired(999));
        assert!(!lease.is_expired(1_000));
        assert!(lease.is_expired(1_001));
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let mut s = waiting_session();
        s.intents
            .insert(PlayerId(10), PlayerIntent::Steer { dir: GridDir::UP });
        s.projectiles.push(Projectile {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::new(0.0, -5.0),
            owner: PlayerId(10),
        });
        let bytes = serde_json::to_vec(&s).unwrap();
        let decoded: Session = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(s, decoded);
    }
}
