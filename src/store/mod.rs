//! Local record store for offline data access.
//!
//! This module provides the `RecordStore` for persisting and querying
//! typed records. Each record type declares a table tag and an id; the
//! store keeps one JSON snapshot file per table.
//!
//! Reads are fail-soft (log and return empty), writes are atomic per
//! batch, and all disk I/O runs off the caller's task.

pub mod manager;
pub mod record;

pub use manager::{RecordStore, StoreError};
pub use record::{Query, Record};
