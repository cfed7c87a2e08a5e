//! Content synchronization between the remote API and the local store.
//!
//! This module provides the `QuizRepository`, which decides per content
//! type whether to serve persisted records or refetch: countries are
//! cached forever once present (store-is-truth), quiz content is wiped
//! and replaced on every successful fetch (network-is-truth) with a
//! media prefetch pass before results are returned.

pub mod sync;

pub use sync::{QuizRepository, SyncError};
