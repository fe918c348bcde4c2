//! The shared state store: document collections with push-based change
//! notification.
//!
//! This is the single point where Facet clients meet. A [`Collection`]
//! holds versioned documents and offers:
//!
//! - point reads and whole-document writes ([`Collection::get`],
//!   [`Collection::put`])
//! - atomic read-modify-write of a single document
//!   ([`Collection::update`]) — how a participant touches its own
//!   intent slot without clobbering siblings
//! - optimistic concurrency ([`Collection::compare_and_swap`]) keyed on
//!   a monotonic per-document version, so a stale host write is
//!   rejected instead of silently lost
//! - predicate queries and live subscriptions ([`Collection::query`],
//!   [`Collection::subscribe`], [`Collection::subscribe_query`])
//!
//! Subscriptions are `tokio::sync::watch`-backed and therefore
//! *coalescing*: a slow consumer observes only the latest value, never
//! every intermediate frame. Nothing downstream may rely on seeing
//! intermediate states.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::{Collection, DocWatch, QueryWatch, Versioned};
