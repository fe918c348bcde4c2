//! The lobby directory: session creation, discovery, joining, and
//! time-based eviction of stale entries.
//!
//! A [`Lobby`] owns the two store collections every client shares —
//! sessions and lobby entries — and is the only place sessions are
//! born. The join path is the one spot where two independent writers
//! race for the second player slot; it runs inside a single atomic
//! store update, so the loser observes a full session and gets
//! [`LobbyError::SessionFull`] instead of silently clobbering the
//! winner.

mod directory;
mod error;
mod reaper;

pub use directory::{GameMode, Lobby};
pub use error::LobbyError;
