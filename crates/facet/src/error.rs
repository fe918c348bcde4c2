//! Unified error type for the Facet meta-crate.

use facet_lobby::LobbyError;
use facet_model::{SessionError, SessionId};
use facet_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `facet` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FacetError {
    /// A lobby-level error (full, unknown session).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A store-level error (missing document, version conflict).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session document invariant violation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Tried to attach a client to a session that doesn't exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The session client task has already stopped.
    #[error("session client is no longer running")]
    ClientStopped,
}
