//! The canonical document model shared by every Facet client.
//!
//! These are the structures that live in the document store: one
//! [`Session`] per game instance, plus one [`LobbyEntry`] per joinable
//! session advertisement. Every process — host or spectator — holds only
//! an eventually-consistent copy derived from its latest store
//! notification; the store is the sole owner of the persisted record.
//!
//! # Key types
//!
//! - [`Session`] — one running or waiting game instance
//! - [`PlayerState`] / [`Kinematics`] — per-player kinematic state
//! - [`PlayerIntent`] — a participant's most recent desired action
//! - [`HostLease`] — the lease that elects the tick-loop driver
//! - [`LobbyEntry`] — a discoverable advertisement for a waiting session

mod lobby;
mod session;

pub use lobby::LobbyEntry;
pub use session::{
    unix_millis, HostLease, Identity, Kinematics, PlayerId, PlayerIntent,
    PlayerState, Projectile, Session, SessionError, SessionId, SessionStatus,
    TankControls, Winner,
};
