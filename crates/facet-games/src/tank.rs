//! The projectile-damage variant: tank battle on a continuous canvas.

use std::collections::HashMap;
use std::time::Duration;

use facet_geometry::{heading_velocity, integrate, within_radius, Bounds, Vec2};
use facet_model::{
    Kinematics, PlayerId, PlayerIntent, PlayerState, Projectile, Session,
    TankControls, Winner,
};
use rand::RngCore;

use crate::GameRules;

/// Settings for the tank variant.
#[derive(Debug, Clone)]
pub struct TankConfig {
    pub bounds: Bounds,
    /// Tanks never get closer than this to an edge.
    pub margin: f64,
    /// Pixels per tick along the heading.
    pub tank_speed: f64,
    /// Radians per tick while a turn control is held.
    pub rotation_speed: f64,
    pub projectile_speed: f64,
    /// Strict hit radius: a projectile exactly on the radius misses.
    pub hit_radius: f64,
    pub tick_period: Duration,
    pub lobby_ttl: Duration,
    /// First player to reach this score wins. `None` leaves play
    /// unbounded (scores only accumulate).
    pub score_limit: Option<u32>,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::new(800.0, 600.0),
            margin: 20.0,
            tank_speed: 2.0,
            rotation_speed: 0.05,
            projectile_speed: 5.0,
            hit_radius: 20.0,
            tick_period: Duration::from_millis(100),
            lobby_ttl: Duration::from_secs(60 * 60),
            score_limit: None,
        }
    }
}

/// Host-local fire bookkeeping: the last fire counter applied per
/// participant. Kept out of the shared document so a fire event is
/// turned into a projectile exactly once.
#[derive(Debug, Default)]
pub struct FireLog {
    applied: HashMap<PlayerId, u64>,
}

/// Projectile-damage rules.
pub struct TankRules;

const CREATOR_COLOR: &str = "#8be9fd";
const JOINER_COLOR: &str = "#ff79c6";

impl GameRules for TankRules {
    type Config = TankConfig;
    type TickState = FireLog;

    fn tick_period(config: &TankConfig) -> Duration {
        config.tick_period
    }

    fn lobby_ttl(config: &TankConfig) -> Duration {
        config.lobby_ttl
    }

    fn spawn_state(config: &TankConfig, slot: usize, name: &str) -> PlayerState {
        let (pos, heading, color) = if slot == 0 {
            (Vec2::new(100.0, 100.0), 0.0, CREATOR_COLOR)
        } else {
            (
                Vec2::new(config.bounds.width - 100.0, config.bounds.height - 100.0),
                std::f64::consts::PI,
                JOINER_COLOR,
            )
        };
        PlayerState {
            name: name.to_string(),
            color: color.to_string(),
            score: 0,
            kinematics: Kinematics::Tank { pos, heading },
        }
    }

    fn initial_food(_config: &TankConfig) -> Option<facet_geometry::Cell> {
        None
    }

    fn advance(
        config: &TankConfig,
        session: &mut Session,
        local: &mut FireLog,
        _rng: &mut dyn RngCore,
    ) -> Option<Winner> {
        drive_tanks(config, session);
        spawn_projectiles(config, session, local);
        resolve_projectiles(config, session);

        let limit = config.score_limit?;
        session
            .players
            .iter()
            .find(|pid| {
                session
                    .player_states
                    .get(pid)
                    .is_some_and(|p| p.score >= limit)
            })
            .map(|pid| Winner::Player(*pid))
    }
}

/// Applies each participant's held controls: rotation, then motion
/// along the heading, clamped to the playfield margin.
fn drive_tanks(config: &TankConfig, session: &mut Session) {
    for pid in &session.players {
        let Some(PlayerIntent::Drive { controls, .. }) =
            session.intents.get(pid).copied()
        else {
            continue;
        };
        let Some(PlayerState {
            kinematics: Kinematics::Tank { pos, heading },
            ..
        }) = session.player_states.get_mut(pid)
        else {
            continue;
        };

        if controls.left {
            *heading -= config.rotation_speed;
        }
        if controls.right {
            *heading += config.rotation_speed;
        }

        let step = movement_step(controls);
        if step != 0.0 {
            let dir = heading_velocity(*heading);
            *pos = config.bounds.clamp(
                integrate(*pos, dir, config.tank_speed * step),
                config.margin,
            );
        }
    }
}

fn movement_step(controls: TankControls) -> f64 {
    match (controls.forward, controls.backward) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Turns unapplied fire events into projectiles, one per counter
/// increment. A participant seen for the first time only registers its
/// current counter — a host taking over mid-game must not replay old
/// fire events.
fn spawn_projectiles(config: &TankConfig, session: &mut Session, local: &mut FireLog) {
    for pid in &session.players {
        let Some(PlayerIntent::Drive { fire_count, .. }) =
            session.intents.get(pid).copied()
        else {
            continue;
        };
        let Some(PlayerState {
            kinematics: Kinematics::Tank { pos, heading },
            ..
        }) = session.player_states.get(pid)
        else {
            continue;
        };

        let applied = match local.applied.get_mut(pid) {
            Some(applied) => applied,
            None => {
                local.applied.insert(*pid, fire_count);
                continue;
            }
        };
        let shots = fire_count.saturating_sub(*applied);
        *applied = fire_count;

        for _ in 0..shots {
            session.projectiles.push(Projectile {
                pos: *pos,
                vel: heading_velocity(*heading) * config.projectile_speed,
                owner: *pid,
            });
        }
    }
}

/// Advances every projectile by its velocity, scores hits, and drops
/// anything that left the playfield.
///
/// A hit is a projectile strictly within `hit_radius` of a participant
/// other than its owner: the owner's score goes up by one and the
/// projectile is removed. A departed owner's projectile still flies and
/// still hits — it just scores for nobody.
fn resolve_projectiles(config: &TankConfig, session: &mut Session) {
    let mut survivors = Vec::with_capacity(session.projectiles.len());
    let mut scores: HashMap<PlayerId, u32> = HashMap::new();

    for projectile in session.projectiles.drain(..) {
        // The velocity already carries the per-tick speed.
        let pos = integrate(projectile.pos, projectile.vel, 1.0);

        let hit = session.player_states.iter().any(|(pid, state)| {
            *pid != projectile.owner
                && matches!(
                    &state.kinematics,
                    Kinematics::Tank { pos: target, .. }
                        if within_radius(pos, *target, config.hit_radius)
                )
        });

        if hit {
            *scores.entry(projectile.owner).or_default() += 1;
            continue;
        }
        if config.bounds.contains(pos) {
            survivors.push(Projectile { pos, ..projectile });
        }
    }

    session.projectiles = survivors;
    for (pid, gained) in scores {
        if let Some(state) = session.player_states.get_mut(&pid) {
            state.score += gained;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use facet_model::{HostLease, SessionId, SessionStatus};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);
    const EPS: f64 = 1e-9;

    fn cfg() -> TankConfig {
        TankConfig::default()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    fn arena() -> Session {
        let config = cfg();
        let mut s = Session::new(
            SessionId(1),
            A,
            TankRules::spawn_state(&config, 0, "alice"),
            SessionStatus::Active,
            None,
            HostLease::new(A, u64::MAX),
        );
        s.players.push(B);
        s.player_states
            .insert(B, TankRules::spawn_state(&config, 1, "bob"));
        s
    }

    fn tank_pos(s: &Session, pid: PlayerId) -> Vec2 {
        match s.player_states[&pid].kinematics {
            Kinematics::Tank { pos, .. } => pos,
            _ => panic!("not a tank"),
        }
    }

    fn drive(controls: TankControls, fire_count: u64) -> PlayerIntent {
        PlayerIntent::Drive {
            controls,
            fire_count,
        }
    }

    fn advance(s: &mut Session, local: &mut FireLog) -> Option<Winner> {
        TankRules::advance(&cfg(), s, local, &mut rng())
    }

    #[test]
    fn test_forward_moves_along_heading() {
        let mut s = arena();
        // Heading 0 points up: y shrinks by tank_speed.
        s.intents.insert(
            A,
            drive(
                TankControls {
                    forward: true,
                    ..Default::default()
                },
                0,
            ),
        );
        advance(&mut s, &mut FireLog::default());
        let pos = tank_pos(&s, A);
        assert!((pos.x - 100.0).abs() < EPS);
        assert!((pos.y - 98.0).abs() < EPS);
    }

    #[test]
    fn test_turning_adjusts_heading() {
        let mut s = arena();
        s.intents.insert(
            A,
            drive(
                TankControls {
                    right: true,
                    ..Default::default()
                },
                0,
            ),
        );
        let mut local = FireLog::default();
        advance(&mut s, &mut local);
        advance(&mut s, &mut local);
        match s.player_states[&A].kinematics {
            Kinematics::Tank { heading, .. } => {
                assert!((heading - 0.10).abs() < EPS);
            }
            _ => panic!("not a tank"),
        }
    }

    #[test]
    fn test_movement_clamped_to_margin() {
        let mut s = arena();
        s.intents.insert(
            A,
            drive(
                TankControls {
                    forward: true,
                    ..Default::default()
                },
                0,
            ),
        );
        let mut local = FireLog::default();
        // 100 px to the top edge at 2 px/tick; drive well past it.
        for _ in 0..100 {
            advance(&mut s, &mut local);
        }
        assert!((tank_pos(&s, A).y - 20.0).abs() < EPS);
    }

    #[test]
    fn test_fire_spawns_one_projectile_per_increment() {
        let mut s = arena();
        let mut local = FireLog::default();

        // First observation only registers the counter.
        s.intents.insert(A, drive(TankControls::default(), 0));
        advance(&mut s, &mut local);
        assert!(s.projectiles.is_empty());

        s.intents.insert(A, drive(TankControls::default(), 1));
        advance(&mut s, &mut local);
        assert_eq!(s.projectiles.len(), 1);
        assert_eq!(s.projectiles[0].owner, A);

        // Same counter again: no duplicate shot.
        advance(&mut s, &mut local);
        assert_eq!(s.projectiles.len(), 1);
    }

    #[test]
    fn test_takeover_does_not_replay_old_fire_events() {
        let mut s = arena();
        s.intents.insert(A, drive(TankControls::default(), 17));
        // Fresh FireLog, as after a host handoff.
        advance(&mut s, &mut FireLog::default());
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn test_hit_scores_shooter_once_and_removes_projectile() {
        let mut s = arena();
        let target = tank_pos(&s, B);
        // A stationary projectile already inside the hit radius.
        s.projectiles.push(Projectile {
            pos: Vec2::new(target.x - 19.0, target.y),
            vel: Vec2::ZERO,
            owner: A,
        });
        advance(&mut s, &mut FireLog::default());
        assert_eq!(s.player_states[&A].score, 1);
        assert_eq!(s.player_states[&B].score, 0);
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn test_exact_radius_is_a_miss() {
        let mut s = arena();
        let target = tank_pos(&s, B);
        s.projectiles.push(Projectile {
            pos: Vec2::new(target.x - 20.0 - 1e-6, target.y),
            vel: Vec2::ZERO,
            owner: A,
        });
        advance(&mut s, &mut FireLog::default());
        assert_eq!(s.player_states[&A].score, 0);
        assert_eq!(s.projectiles.len(), 1);
    }

    #[test]
    fn test_projectile_never_hits_its_owner() {
        let mut s = arena();
        let own = tank_pos(&s, A);
        s.projectiles.push(Projectile {
            pos: own,
            vel: Vec2::ZERO,
            owner: A,
        });
        advance(&mut s, &mut FireLog::default());
        assert_eq!(s.player_states[&A].score, 0);
        assert_eq!(s.projectiles.len(), 1);
    }

    #[test]
    fn test_out_of_bounds_projectile_is_removed() {
        let mut s = arena();
        s.projectiles.push(Projectile {
            pos: Vec2::new(798.0, 300.0),
            vel: Vec2::new(5.0, 0.0),
            owner: A,
        });
        advance(&mut s, &mut FireLog::default());
        assert!(s.projectiles.is_empty());
    }

    #[test]
    fn test_departed_owner_projectile_persists_and_flies() {
        let mut s = arena();
        // Owner 99 left the session; its shot keeps moving.
        s.projectiles.push(Projectile {
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::new(5.0, 0.0),
            owner: PlayerId(99),
        });
        advance(&mut s, &mut FireLog::default());
        assert_eq!(s.projectiles.len(), 1);
        assert!((s.projectiles[0].pos.x - 405.0).abs() < EPS);
    }

    #[test]
    fn test_score_limit_finishes_the_session() {
        let mut config = cfg();
        config.score_limit = Some(3);
        let mut s = arena();
        s.player_states.get_mut(&A).unwrap().score = 2;
        let target = tank_pos(&s, B);
        s.projectiles.push(Projectile {
            pos: Vec2::new(target.x - 5.0, target.y),
            vel: Vec2::ZERO,
            owner: A,
        });
        let outcome =
            TankRules::advance(&config, &mut s, &mut FireLog::default(), &mut rng());
        assert_eq!(outcome, Some(Winner::Player(A)));
        assert_eq!(s.player_states[&A].score, 3);
    }

    #[test]
    fn test_no_score_limit_means_unbounded_play() {
        let mut s = arena();
        s.player_states.get_mut(&A).unwrap().score = 1_000;
        assert!(advance(&mut s, &mut FireLog::default()).is_none());
    }
}
