//! A headless two-player snake match, played entirely in-process.
//!
//! Run with `RUST_LOG=debug cargo run -p snake-match` to watch the
//! session lifecycle in the logs.

use facet::prelude::*;
use facet::{init_tracing, SteerInput};
use facet_geometry::GridDir;

#[tokio::main]
async fn main() -> Result<(), FacetError> {
    init_tracing();

    let lobby: Lobby<SnakeRules> = Lobby::new(SnakeConfig::default());
    let alice = Identity::new(PlayerId(1), "alice");
    let bob = Identity::new(PlayerId(2), "bob");

    let id = lobby.create_session(&alice, GameMode::TwoPlayer);
    lobby.join_session(id, &bob)?;

    let host = SessionClient::spawn(&lobby, id, Role::Participant(alice.id))?;
    let guest = SessionClient::spawn(&lobby, id, Role::Participant(bob.id))?;

    // Bob heads for the top edge; alice drives straight at the right
    // wall and loses first.
    let mut keys = SteerInput::default();
    if let Some(intent) = keys.key_down(GridDir::UP) {
        guest.send_intent(intent).await?;
    }

    let mut frames = host.snapshots();
    while frames.changed().await.is_ok() {
        let Some(session) = frames.borrow().clone() else {
            break;
        };
        if session.status == SessionStatus::Finished {
            match session.winner {
                Some(Winner::Player(p)) => {
                    println!("{} wins", session.player_states[&p].name);
                }
                _ => println!("draw"),
            }
            break;
        }
    }

    guest.leave().await?;
    host.wait().await?;
    Ok(())
}
