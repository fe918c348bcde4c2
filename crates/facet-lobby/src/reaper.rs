//! Time-based eviction of unclaimed lobby entries.

use std::time::SystemTime;

use facet_games::GameRules;
use facet_model::SessionStatus;

use crate::Lobby;

impl<G: GameRules> Lobby<G> {
    /// Removes every lobby entry older than the variant's TTL as of
    /// `now`, together with its paired session document if the session
    /// is still waiting.
    ///
    /// Deleting the session too is what lets a creator still sitting on
    /// the waiting screen observe the eviction: their session
    /// subscription yields `None` and they fall back to the lobby.
    /// Returns how many entries were evicted.
    pub fn reap_stale(&self, now: SystemTime) -> usize {
        let ttl = G::lobby_ttl(self.config());
        let stale: Vec<_> = self
            .entries()
            .query(|e| e.is_stale(now, ttl))
            .into_iter()
            .map(|e| e.id)
            .collect();
        if stale.is_empty() {
            return 0;
        }

        let reaped = self.entries().delete_many(stale.iter().copied());
        // Only sessions still waiting go with their entry. A join that
        // landed after the staleness check keeps its now-active session.
        let unclaimed: Vec<_> = self
            .sessions()
            .query(|s| stale.contains(&s.id) && s.status == SessionStatus::Waiting)
            .into_iter()
            .map(|s| s.id)
            .collect();
        self.sessions().delete_many(unclaimed);
        tracing::info!(count = reaped, "reaped stale lobby entries");
        reaped
    }

    /// [`Self::reap_stale`] against the wall clock.
    pub fn reap_now(&self) -> usize {
        self.reap_stale(SystemTime::now())
    }
}
