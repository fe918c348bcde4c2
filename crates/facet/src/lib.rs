//! # Facet
//!
//! Shared-document session sync core for two-player web games.
//!
//! Facet keeps a small fleet of peers in agreement about one game
//! session without a dedicated game server: the session lives as a
//! single document in a store, one participant holds a host lease and
//! drives the simulation tick, and everyone else follows the document
//! through store subscriptions.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use facet::prelude::*;
//!
//! # async fn demo() -> Result<(), FacetError> {
//! let lobby: Lobby<SnakeRules> = Lobby::new(SnakeConfig::default());
//! let alice = Identity::new(PlayerId(1), "alice");
//!
//! let id = lobby.create_session(&alice, GameMode::TwoPlayer);
//! let client = SessionClient::spawn(&lobby, id, Role::Participant(alice.id))?;
//!
//! let mut frames = client.snapshots();
//! while frames.changed().await.is_ok() {
//!     // render the latest snapshot
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod input;
mod telemetry;

pub use client::{
    ClientOptions, ExitReason, IntentDelivery, Role, SessionClient, SessionHandle,
};
pub use error::FacetError;
pub use input::{DriveInput, DriveKey, SteerInput};
pub use telemetry::init_tracing;

/// The most commonly used types, re-exported for a single glob import.
pub mod prelude {
    pub use crate::{
        ClientOptions, ExitReason, FacetError, IntentDelivery, Role,
        SessionClient, SessionHandle,
    };
    pub use facet_games::{
        GameRules, SnakeConfig, SnakeRules, TankConfig, TankRules,
    };
    pub use facet_lobby::{GameMode, Lobby, LobbyError};
    pub use facet_model::{
        Identity, Kinematics, PlayerId, PlayerIntent, Session, SessionId,
        SessionStatus, TankControls, Winner,
    };
}
