//! The lobby directory: creates, lists, and joins sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use facet_games::GameRules;
use facet_model::{
    HostLease, Identity, LobbyEntry, Session, SessionId, SessionStatus,
};
use facet_store::Collection;
use futures_util::Stream;

use crate::LobbyError;

/// Counter for allocating session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// How a new session should start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Starts immediately, bypassing the lobby.
    SinglePlayer,
    /// Waits in the lobby for a second player.
    TwoPlayer,
}

/// The directory of sessions and their lobby advertisements for one
/// game variant.
///
/// Cheap to clone — all clones share the same collections, which is
/// what makes two clients meet in the first place.
pub struct Lobby<G: GameRules> {
    config: G::Config,
    sessions: Collection<SessionId, Session>,
    entries: Collection<SessionId, LobbyEntry>,
}

impl<G: GameRules> Clone for Lobby<G> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<G: GameRules> Lobby<G> {
    pub fn new(config: G::Config) -> Self {
        Self {
            config,
            sessions: Collection::new(),
            entries: Collection::new(),
        }
    }

    /// The shared session collection. Session clients subscribe here.
    pub fn sessions(&self) -> &Collection<SessionId, Session> {
        &self.sessions
    }

    /// The lobby entry collection.
    pub fn entries(&self) -> &Collection<SessionId, LobbyEntry> {
        &self.entries
    }

    pub fn config(&self) -> &G::Config {
        &self.config
    }

    /// Allocates a session with the creator placed at spawn slot 0.
    ///
    /// Two-player sessions start `Waiting` and get a lobby entry;
    /// single-player sessions start running immediately and are never
    /// advertised.
    pub fn create_session(&self, creator: &Identity, mode: GameMode) -> SessionId {
        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        let status = match mode {
            GameMode::SinglePlayer => SessionStatus::SinglePlayer,
            GameMode::TwoPlayer => SessionStatus::Waiting,
        };
        let session = Session::new(
            id,
            creator.id,
            G::spawn_state(&self.config, 0, &creator.name),
            status,
            G::initial_food(&self.config),
            HostLease::granted_to(creator.id, SystemTime::now()),
        );
        self.sessions.put(id, session);

        if mode == GameMode::TwoPlayer {
            self.entries
                .put(id, LobbyEntry::new(id, creator.id, creator.name.clone()));
        }

        tracing::info!(session = %id, creator = %creator.id, ?mode, "session created");
        id
    }

    /// Claims the second player slot.
    ///
    /// The whole check-and-insert runs as one atomic store update, so
    /// of two racing joiners exactly one wins; the other gets
    /// [`LobbyError::SessionFull`] and the session is left untouched.
    /// On success the status flips to `Active` and the lobby entry is
    /// deleted.
    pub fn join_session(
        &self,
        id: SessionId,
        joiner: &Identity,
    ) -> Result<(), LobbyError> {
        let joiner_state = G::spawn_state(&self.config, 1, &joiner.name);
        let joiner_id = joiner.id;
        let mut outcome = Ok(());

        self.sessions.update(&id, |session| {
            if !session.status.is_joinable()
                || session.player_states.len() >= 2
                || session.has_player(joiner_id)
            {
                outcome = Err(LobbyError::SessionFull(id));
                return;
            }
            session.players.push(joiner_id);
            session.player_states.insert(joiner_id, joiner_state);
            session.status = SessionStatus::Active;
        })?;
        outcome?;

        // The entry may already be gone (reaped); that's fine.
        if self.entries.delete(&id).is_err() {
            tracing::debug!(session = %id, "lobby entry already removed");
        }

        tracing::info!(session = %id, joiner = %joiner_id, "player joined, session active");
        Ok(())
    }

    /// A point-in-time snapshot of joinable sessions, oldest first.
    pub fn waiting_entries(&self) -> Vec<LobbyEntry> {
        let mut entries = self.entries.query(|_| true);
        entries.sort_by_key(|e| (e.created_at, e.id.0));
        entries
    }

    /// A lazy, continuously refreshed sequence of lobby snapshots.
    ///
    /// Entering the lobby sweeps stale entries first, then yields the
    /// current entry list immediately and a fresh list on every lobby
    /// change. Restart by calling again.
    pub fn open_sessions(&self) -> impl Stream<Item = Vec<LobbyEntry>> + Send {
        self.reap_now();
        let watch = self.entries.subscribe_query(|_| true);
        futures_util::stream::unfold((watch, true), |(mut watch, first)| async move {
            if !first && !watch.changed().await {
                return None;
            }
            let mut entries = watch.current();
            entries.sort_by_key(|e| (e.created_at, e.id.0));
            Some((entries, (watch, false)))
        })
    }

    /// Sessions a non-participant can watch: running, lobby-independent.
    pub fn spectatable_sessions(&self) -> Vec<Session> {
        let mut sessions = self.sessions.query(|s| s.status.is_spectatable());
        sessions.sort_by_key(|s| s.id.0);
        sessions
    }
}
