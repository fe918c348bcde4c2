//! Error types for the lobby layer.

use facet_model::SessionId;
use facet_store::StoreError;

/// Errors that can occur during lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The session already has two players, or the joiner created it.
    /// Surfaced to the caller; never retried.
    #[error("session {0} is full")]
    SessionFull(SessionId),

    /// The underlying document vanished or the write was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),
}
