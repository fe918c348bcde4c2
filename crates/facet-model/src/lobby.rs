//! Lobby entries: discoverable advertisements for waiting sessions.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::{PlayerId, SessionId};

/// A joinable advertisement for a waiting session.
///
/// Created atomically with its session, and deleted the moment a second
/// participant joins — or unilaterally by the reaper once its TTL
/// elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyEntry {
    /// Shared with the session it advertises.
    pub id: SessionId,
    pub creator: PlayerId,
    pub creator_name: String,
    pub created_at: SystemTime,
}

impl LobbyEntry {
    pub fn new(id: SessionId, creator: PlayerId, creator_name: impl Into<String>) -> Self {
        Self {
            id,
            creator,
            creator_name: creator_name.into(),
            created_at: SystemTime::now(),
        }
    }

    /// True when the entry is older than `ttl` as of `now`.
    pub fn is_stale(&self, now: SystemTime, ttl: Duration) -> bool {
        match now.duration_since(self.created_at) {
            Ok(age) => age > ttl,
            // created_at in the future (clock skew) — not stale.
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stale_boundary() {
        let ttl = Duration::from_secs(600);
        let entry = LobbyEntry::new(SessionId(1), PlayerId(1), "alice");
        let now = entry.created_at;

        assert!(entry.is_stale(now + ttl + Duration::from_secs(1), ttl));
        assert!(!entry.is_stale(now + ttl - Duration::from_secs(1), ttl));
        assert!(!entry.is_stale(now + ttl, ttl));
    }

    #[test]
    fn test_future_created_at_is_not_stale() {
        let mut entry = LobbyEntry::new(SessionId(1), PlayerId(1), "alice");
        entry.created_at = SystemTime::now() + Duration::from_secs(3600);
        assert!(!entry.is_stale(SystemTime::now(), Duration::from_secs(600)));
    }

    #[test]
    fn test_round_trips_through_json() {
        let entry = LobbyEntry::new(SessionId(9), PlayerId(3), "bob");
        let bytes = serde_json::to_vec(&entry).unwrap();
        let decoded: LobbyEntry = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(entry, decoded);
    }
}
