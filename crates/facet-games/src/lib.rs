//! Game variant rules for Facet.
//!
//! The [`GameRules`] trait is the single seam between the simulation
//! tick engine and a concrete game. The engine owns the schedule, the
//! store round-trips, and the authority lease; the rules own spawn
//! points, intent application, movement, collision, and scoring.
//!
//! Two variants ship:
//!
//! - [`SnakeRules`] — growth-and-elimination on a discrete grid
//! - [`TankRules`] — projectile-damage on a continuous canvas

mod snake;
mod tank;

use std::time::Duration;

use facet_geometry::Cell;
use facet_model::{PlayerState, Session, Winner};
use rand::RngCore;

pub use snake::{SnakeConfig, SnakeRules};
pub use tank::{TankConfig, TankRules};

/// The rules of one game variant.
///
/// All methods are static, taking the config explicitly — rules carry
/// no state of their own. Host-local bookkeeping that must survive
/// between ticks (but never enters the shared document) lives in
/// `TickState`.
pub trait GameRules: Send + Sync + 'static {
    /// Variant settings (board size, speeds, win condition, …).
    type Config: Clone + Send + Sync + 'static;

    /// Host-local per-session scratch state, e.g. which fire events
    /// have already been applied. Reset when the host role moves.
    type TickState: Default + Send + 'static;

    /// Fixed simulation period for this variant.
    fn tick_period(config: &Self::Config) -> Duration;

    /// How long a lobby entry for this variant may sit unclaimed.
    fn lobby_ttl(config: &Self::Config) -> Duration;

    /// Initial state for the participant joining in `slot`
    /// (0 = creator, 1 = joiner). Spawn points are distinct so the two
    /// players never start overlapped.
    fn spawn_state(config: &Self::Config, slot: usize, name: &str) -> PlayerState;

    /// Initial food cell, for variants that have one.
    fn initial_food(config: &Self::Config) -> Option<Cell>;

    /// One simulation step: apply each participant's latest published
    /// intent, integrate movement, resolve collisions and scoring.
    ///
    /// Returns `Some(winner)` when a terminal condition arises; the
    /// engine then finishes the session and stops writing kinematics.
    fn advance(
        config: &Self::Config,
        session: &mut Session,
        local: &mut Self::TickState,
        rng: &mut dyn RngCore,
    ) -> Option<Winner>;
}
