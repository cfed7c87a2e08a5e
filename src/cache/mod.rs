//! Media caching module for offline image access.
//!
//! This module provides the `MediaCache`, a URL-keyed blob cache with
//! two tiers: an in-memory LRU bounded by item count and byte cost, and
//! a best-effort durable tier on disk. The synchronizer uses it to warm
//! images referenced by freshly synced content; view layers fall back to
//! `fetch_and_cache` on a miss.

pub mod media;

pub use media::{HttpTransport, MediaCache, MediaError, MediaTransport};
