//! Session client actor: an isolated Tokio task that follows one
//! session document.
//!
//! Every process attached to a session — host, opponent, spectator —
//! runs the same actor. What differs is which `select!` branches do
//! work:
//!
//! - everyone follows the store subscription and republishes snapshots
//!   for its render loop;
//! - participants forward their local intents into the document;
//! - exactly one participant holds the host lease, and only while it
//!   does is the tick scheduler armed.
//!
//! The host tick is a read → advance → compare-and-swap cycle. A version
//! conflict (someone else wrote between our read and our write) skips
//! the tick; the competing write arrives through the subscription and
//! the next tick starts from it.

use std::time::{Duration, SystemTime};

use facet_games::GameRules;
use facet_lobby::Lobby;
use facet_model::{
    unix_millis, HostLease, PlayerId, PlayerIntent, Session, SessionError,
    SessionId, SessionStatus, Winner,
};
use facet_store::{Collection, DocWatch, StoreError};
use facet_tick::TickScheduler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::FacetError;

/// What a client is to its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Plays: publishes intents, eligible for the host lease.
    Participant(PlayerId),
    /// Watches: follows snapshots, never writes.
    Spectator,
}

/// How a participant's intent reaches the shared document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntentDelivery {
    /// Write the intent slot immediately when input arrives. Works for
    /// every participant; costs one store write per input change.
    #[default]
    DirectWrite,

    /// Hold the latest intent locally and fold it into the next tick
    /// write. Saves a write, but only applies while this client holds
    /// the host lease; otherwise it falls back to a direct write.
    HostLocalBuffer,
}

/// Tunables for a session client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub delivery: IntentDelivery,
    /// How often a non-host checks the lease for expiry.
    pub lease_check_period: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            delivery: IntentDelivery::default(),
            lease_check_period: HostLease::TTL / 2,
        }
    }
}

/// Why a session client stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The session reached a terminal state. The final snapshot stays
    /// available on the handle's watch.
    Finished(Option<Winner>),
    /// The session document was deleted (reaped, or torn down).
    SessionDeleted,
    /// The local user left.
    Left,
}

enum ClientCommand {
    Intent(PlayerIntent),
    Leave,
}

/// Handle to a running session client. Cheap operations only — the
/// actual work happens in the actor task.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<ClientCommand>,
    snapshots: watch::Receiver<Option<Session>>,
    task: JoinHandle<ExitReason>,
}

impl SessionHandle {
    /// Forwards a local input intent to the actor.
    pub async fn send_intent(&self, intent: PlayerIntent) -> Result<(), FacetError> {
        self.commands
            .send(ClientCommand::Intent(intent))
            .await
            .map_err(|_| FacetError::ClientStopped)
    }

    /// A watch over session snapshots for the render loop. `None` means
    /// the document was deleted.
    pub fn snapshots(&self) -> watch::Receiver<Option<Session>> {
        self.snapshots.clone()
    }

    /// The latest snapshot without waiting.
    pub fn current(&self) -> Option<Session> {
        self.snapshots.borrow().clone()
    }

    /// Tells the actor to stop and waits for it.
    pub async fn leave(self) -> Result<ExitReason, FacetError> {
        let _ = self.commands.send(ClientCommand::Leave).await;
        self.task.await.map_err(|_| FacetError::ClientStopped)
    }

    /// Waits for the actor to stop on its own (session finished or
    /// deleted).
    pub async fn wait(self) -> Result<ExitReason, FacetError> {
        self.task.await.map_err(|_| FacetError::ClientStopped)
    }
}

/// The session client actor. Construct with [`SessionClient::spawn`].
pub struct SessionClient<G: GameRules> {
    id: SessionId,
    role: Role,
    config: G::Config,
    delivery: IntentDelivery,
    sessions: Collection<SessionId, Session>,
    subscription: DocWatch<Session>,
    scheduler: TickScheduler,
    local: G::TickState,
    /// Latest unapplied intent in `HostLocalBuffer` mode.
    buffered: Option<PlayerIntent>,
    lease_check_period: Duration,
    rng: StdRng,
    commands: mpsc::Receiver<ClientCommand>,
    snapshots: watch::Sender<Option<Session>>,
}

impl<G: GameRules> SessionClient<G> {
    /// Spawns a client task for `id` with default options.
    pub fn spawn(
        lobby: &Lobby<G>,
        id: SessionId,
        role: Role,
    ) -> Result<SessionHandle, FacetError> {
        Self::spawn_with(lobby, id, role, ClientOptions::default())
    }

    /// Spawns a client task for `id`.
    ///
    /// Fails if the session doesn't exist, or if a participant role
    /// names a player the session doesn't have.
    pub fn spawn_with(
        lobby: &Lobby<G>,
        id: SessionId,
        role: Role,
        options: ClientOptions,
    ) -> Result<SessionHandle, FacetError> {
        let sessions = lobby.sessions().clone();
        let subscription = sessions
            .subscribe(&id)
            .map_err(|_| FacetError::SessionNotFound(id))?;
        let initial = sessions.get(&id)?.value;

        if let Role::Participant(me) = role {
            if !initial.has_player(me) {
                return Err(SessionError::UnknownPlayer(me, id).into());
            }
        }

        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(Some(initial.clone()));

        let mut client = Self {
            id,
            role,
            config: lobby.config().clone(),
            delivery: options.delivery,
            sessions,
            subscription,
            scheduler: TickScheduler::with_period(G::tick_period(lobby.config())),
            local: G::TickState::default(),
            buffered: None,
            lease_check_period: options.lease_check_period,
            rng: StdRng::from_os_rng(),
            commands: command_rx,
            snapshots: snapshot_tx,
        };
        client.sync_authority(&initial);

        let task = tokio::spawn(client.run());

        Ok(SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        })
    }

    async fn run(mut self) -> ExitReason {
        info!(session = %self.id, role = ?self.role, "session client started");

        let mut lease_check = tokio::time::interval(self.lease_check_period);
        lease_check.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(ClientCommand::Intent(intent)) => {
                            if let Some(reason) = self.handle_intent(intent) {
                                break reason;
                            }
                        }
                        // A dropped handle counts as leaving.
                        Some(ClientCommand::Leave) | None => break ExitReason::Left,
                    }
                }
                alive = self.subscription.changed() => {
                    if !alive {
                        break ExitReason::SessionDeleted;
                    }
                    if let Some(reason) = self.handle_snapshot() {
                        break reason;
                    }
                }
                _ = lease_check.tick() => {
                    if let Some(reason) = self.check_lease() {
                        break reason;
                    }
                }
                _ = self.scheduler.wait_for_tick() => {
                    if let Some(reason) = self.run_tick() {
                        break reason;
                    }
                }
            }
        };

        info!(session = %self.id, ?reason, "session client stopped");
        reason
    }

    /// Routes a local input intent to the document (or the tick buffer).
    fn handle_intent(&mut self, intent: PlayerIntent) -> Option<ExitReason> {
        let Role::Participant(me) = self.role else {
            debug!(session = %self.id, "spectator intent ignored");
            return None;
        };

        if self.delivery == IntentDelivery::HostLocalBuffer && self.scheduler.is_armed() {
            self.buffered = Some(intent);
            return None;
        }

        // Single-writer rule: a participant only ever touches its own
        // intent slot.
        match self.sessions.update(&self.id, |session| {
            session.intents.insert(me, intent);
        }) {
            Ok(_) => None,
            Err(StoreError::NotFound(_)) => {
                let _ = self.snapshots.send(None);
                Some(ExitReason::SessionDeleted)
            }
            Err(err) => {
                warn!(session = %self.id, %err, "intent write failed");
                None
            }
        }
    }

    /// Processes a store notification: republish, then re-evaluate
    /// whether we should be ticking.
    fn handle_snapshot(&mut self) -> Option<ExitReason> {
        let Some(doc) = self.subscription.current() else {
            let _ = self.snapshots.send(None);
            return Some(ExitReason::SessionDeleted);
        };

        let session = doc.value;
        let winner = session.winner;
        let _ = self.snapshots.send(Some(session.clone()));

        if session.status == SessionStatus::Finished {
            self.scheduler.disarm();
            return Some(ExitReason::Finished(winner));
        }

        self.sync_authority(&session);
        None
    }

    /// Arms the scheduler iff we are the running session's lease holder.
    fn sync_authority(&mut self, session: &Session) {
        let am_host = matches!(self.role, Role::Participant(me)
            if session.status.is_running() && session.host() == me);
        if am_host {
            if !self.scheduler.is_armed() {
                // Fresh authority: host-local bookkeeping starts over.
                self.local = G::TickState::default();
                self.scheduler.arm();
            }
        } else {
            self.scheduler.disarm();
        }
    }

    /// Non-host path: claim the host lease if it has expired and we are
    /// the deterministic successor.
    fn check_lease(&mut self) -> Option<ExitReason> {
        let Role::Participant(me) = self.role else {
            return None;
        };
        if self.scheduler.is_armed() {
            // We are the ticking host; renewal happens on tick writes.
            return None;
        }

        let doc = match self.sessions.get(&self.id) {
            Ok(doc) => doc,
            Err(_) => {
                let _ = self.snapshots.send(None);
                return Some(ExitReason::SessionDeleted);
            }
        };
        let session = doc.value;
        if !session.status.is_running() {
            return None;
        }

        let now_ms = unix_millis(SystemTime::now());
        if !session.host_lease.is_expired(now_ms) {
            return None;
        }
        let eligible = session.host() == me
            || session.lease_successor(session.host()) == Some(me);
        if !eligible {
            return None;
        }

        let mut claimed = session;
        claimed.host_lease = HostLease::granted_to(me, SystemTime::now());
        match self.sessions.compare_and_swap(&self.id, doc.version, claimed) {
            Ok(_) => {
                info!(session = %self.id, player = %me, "host lease claimed");
                // Arming happens in sync_authority when our own write
                // arrives through the subscription.
            }
            Err(StoreError::VersionConflict { .. }) => {
                trace!(session = %self.id, "lease claim lost the race");
            }
            Err(StoreError::NotFound(_)) => {
                let _ = self.snapshots.send(None);
                return Some(ExitReason::SessionDeleted);
            }
        }
        None
    }

    /// One host tick: read, advance, write back with a version check.
    fn run_tick(&mut self) -> Option<ExitReason> {
        let Role::Participant(me) = self.role else {
            self.scheduler.disarm();
            return None;
        };

        let doc = match self.sessions.get(&self.id) {
            Ok(doc) => doc,
            Err(_) => {
                let _ = self.snapshots.send(None);
                return Some(ExitReason::SessionDeleted);
            }
        };
        self.advance_and_store(me, doc.version, doc.value)
    }

    /// Advances one tick from a session read at version `expected` and
    /// writes it back with a version check.
    fn advance_and_store(
        &mut self,
        me: PlayerId,
        expected: u64,
        mut session: Session,
    ) -> Option<ExitReason> {
        if !session.status.is_running() || session.host() != me {
            self.scheduler.disarm();
            return None;
        }

        // Every tick write doubles as a lease renewal.
        session.host_lease = HostLease::granted_to(me, SystemTime::now());
        let folded = self.buffered.take();
        if let Some(intent) = folded {
            session.intents.insert(me, intent);
        }

        let outcome =
            G::advance(&self.config, &mut session, &mut self.local, &mut self.rng);
        if let Some(winner) = outcome {
            if let Err(err) = session.finish(winner) {
                warn!(session = %self.id, %err, "finish rejected");
            }
        }

        match self.sessions.compare_and_swap(&self.id, expected, session) {
            Ok(_) => {
                if outcome.is_some() {
                    // Our own terminal write comes back through the
                    // subscription and ends the actor there.
                    self.scheduler.disarm();
                }
            }
            Err(StoreError::VersionConflict { actual, .. }) => {
                // Someone wrote since our read (an intent, or a rival
                // host). Skip the tick; the folded intent never reached
                // the store, so it goes back in the buffer for the next
                // one.
                if let Some(intent) = folded {
                    self.buffered.get_or_insert(intent);
                }
                trace!(session = %self.id, actual, "tick write conflicted, skipped");
            }
            Err(StoreError::NotFound(_)) => {
                let _ = self.snapshots.send(None);
                return Some(ExitReason::SessionDeleted);
            }
        }
        None
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use facet_games::{SnakeConfig, SnakeRules};
    use facet_geometry::GridDir;
    use facet_lobby::GameMode;
    use facet_model::Identity;

    /// A client actor with its channels wired up but no task running,
    /// so tick steps can be driven by hand.
    fn actor(
        lobby: &Lobby<SnakeRules>,
        id: SessionId,
        me: PlayerId,
    ) -> SessionClient<SnakeRules> {
        let sessions = lobby.sessions().clone();
        let subscription = sessions.subscribe(&id).unwrap();
        let (_command_tx, command_rx) = mpsc::channel(8);
        let (snapshot_tx, _snapshot_rx) = watch::channel(None);
        SessionClient {
            id,
            role: Role::Participant(me),
            config: lobby.config().clone(),
            delivery: IntentDelivery::HostLocalBuffer,
            sessions,
            subscription,
            scheduler: TickScheduler::with_period(SnakeRules::tick_period(lobby.config())),
            local: (),
            buffered: None,
            lease_check_period: Duration::from_secs(1),
            rng: StdRng::from_os_rng(),
            commands: command_rx,
            snapshots: snapshot_tx,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_conflicted_tick_write_keeps_the_buffered_intent() {
        let lobby: Lobby<SnakeRules> = Lobby::new(SnakeConfig::default());
        let me = PlayerId(1);
        let id = lobby.create_session(&Identity::new(me, "alice"), GameMode::SinglePlayer);
        let mut client = actor(&lobby, id, me);

        let intent = PlayerIntent::Steer { dir: GridDir::DOWN };
        client.buffered = Some(intent);

        // Read one version, then let a rival write land before ours.
        let doc = client.sessions.get(&id).unwrap();
        lobby.sessions().update(&id, |_| {}).unwrap();

        assert!(client.advance_and_store(me, doc.version, doc.value).is_none());
        assert_eq!(client.buffered, Some(intent), "skipped tick holds the intent");
        assert!(lobby.sessions().get(&id).unwrap().value.intents.is_empty());

        // The next tick reads fresh and lands it.
        assert!(client.run_tick().is_none());
        assert_eq!(client.buffered, None);
        assert_eq!(
            lobby.sessions().get(&id).unwrap().value.intents.get(&me),
            Some(&intent)
        );
    }
}
