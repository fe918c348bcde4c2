//! Error types for the store layer.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document does not exist (or was deleted). Loops observing a
    /// session must treat this as terminal, not retry.
    #[error("document {0} not found")]
    NotFound(String),

    /// An optimistic write lost the race: the document moved on while
    /// the writer held a stale snapshot.
    #[error("version conflict: expected {expected}, document is at {actual}")]
    VersionConflict { expected: u64, actual: u64 },
}
