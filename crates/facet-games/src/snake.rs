//! The growth-and-elimination variant: competitive snake on a grid.

use std::time::Duration;

use facet_geometry::{Cell, Grid, GridDir};
use facet_model::{
    Kinematics, PlayerId, PlayerIntent, PlayerState, Session, Winner,
};
use rand::{Rng, RngCore};

use crate::GameRules;

/// Settings for the snake variant.
#[derive(Debug, Clone)]
pub struct SnakeConfig {
    pub grid: Grid,
    pub tick_period: Duration,
    pub lobby_ttl: Duration,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            // 600 px canvas at 20 px cells.
            grid: Grid::new(30, 30),
            tick_period: Duration::from_millis(120),
            lobby_ttl: Duration::from_secs(10 * 60),
        }
    }
}

/// Growth-and-elimination rules.
///
/// Each tick every snake's leading segment advances one cell in its
/// current direction. Leaving the board or landing on any occupied body
/// cell eliminates the snake; the surviving opponent (or a draw) ends
/// the session. Eating the food cell grows the body by one segment and
/// relocates the food to a pseudo-random in-bounds cell.
pub struct SnakeRules;

const CREATOR_COLOR: &str = "#8be9fd";
const JOINER_COLOR: &str = "#ff79c6";

impl GameRules for SnakeRules {
    type Config = SnakeConfig;
    type TickState = ();

    fn tick_period(config: &SnakeConfig) -> Duration {
        config.tick_period
    }

    fn lobby_ttl(config: &SnakeConfig) -> Duration {
        config.lobby_ttl
    }

    fn spawn_state(config: &SnakeConfig, slot: usize, name: &str) -> PlayerState {
        // Opposite corners, heading toward each other.
        let (cell, dir, color) = if slot == 0 {
            (Cell::new(5, 5), GridDir::RIGHT, CREATOR_COLOR)
        } else {
            (
                Cell::new(config.grid.width - 6, config.grid.height - 6),
                GridDir::LEFT,
                JOINER_COLOR,
            )
        };
        PlayerState {
            name: name.to_string(),
            color: color.to_string(),
            score: 0,
            kinematics: Kinematics::Snake {
                body: vec![cell],
                dir,
            },
        }
    }

    fn initial_food(config: &SnakeConfig) -> Option<Cell> {
        Some(Cell::new(config.grid.width / 2, config.grid.height / 2))
    }

    fn advance(
        config: &SnakeConfig,
        session: &mut Session,
        _local: &mut (),
        rng: &mut dyn RngCore,
    ) -> Option<Winner> {
        apply_steering(session);

        // Collision is resolved against the bodies as they stood at the
        // start of the tick, not against positions updated mid-loop.
        let pre_move: Vec<(PlayerId, Vec<Cell>)> = session
            .players
            .iter()
            .filter_map(|pid| match session.player_states.get(pid) {
                Some(PlayerState {
                    kinematics: Kinematics::Snake { body, .. },
                    ..
                }) => Some((*pid, body.clone())),
                _ => None,
            })
            .collect();

        for (pid, _) in &pre_move {
            let Some(PlayerState {
                kinematics: Kinematics::Snake { body, dir },
                ..
            }) = session.player_states.get(pid)
            else {
                continue;
            };
            let head = body[0].step(*dir);
            let grows = session.food == Some(head);

            if !config.grid.contains(head)
                || hits_body(&pre_move, *pid, head, grows)
            {
                let winner = session
                    .opponent_of(*pid)
                    .map(Winner::Player)
                    .unwrap_or(Winner::Draw);
                tracing::debug!(session = %session.id, player = %pid, "snake eliminated");
                return Some(winner);
            }

            let Some(PlayerState {
                kinematics: Kinematics::Snake { body, .. },
                ..
            }) = session.player_states.get_mut(pid)
            else {
                continue;
            };
            body.insert(0, head);
            if grows {
                session.food = Some(random_cell(config.grid, rng));
            } else {
                body.pop();
            }
        }

        None
    }
}

/// Applies each participant's published steering intent, silently
/// dropping 180° reversals (a turn into the body's current axis).
fn apply_steering(session: &mut Session) {
    for pid in &session.players {
        let Some(PlayerIntent::Steer { dir: wanted }) =
            session.intents.get(pid).copied()
        else {
            continue;
        };
        if let Some(PlayerState {
            kinematics: Kinematics::Snake { dir, .. },
            ..
        }) = session.player_states.get_mut(pid)
        {
            if !wanted.same_axis(*dir) {
                *dir = wanted;
            }
        }
    }
}

/// True when `head` lands on an occupied pre-move body cell. The moving
/// snake's own tail cell is exempt when it vacates this tick (i.e. the
/// snake is not growing).
fn hits_body(
    bodies: &[(PlayerId, Vec<Cell>)],
    mover: PlayerId,
    head: Cell,
    grows: bool,
) -> bool {
    for (pid, body) in bodies {
        for (i, cell) in body.iter().enumerate() {
            if *cell != head {
                continue;
            }
            let own_vacating_tail =
                *pid == mover && i == body.len() - 1 && !grows;
            if !own_vacating_tail {
                return true;
            }
        }
    }
    false
}

/// Uniform random in-bounds cell. Deliberately not validated against
/// body overlap.
fn random_cell(grid: Grid, rng: &mut dyn RngCore) -> Cell {
    Cell::new(
        rng.random_range(0..grid.width),
        rng.random_range(0..grid.height),
    )
}

// =========================================================================
// Tests
// =========================================================================
