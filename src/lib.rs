//! Quizcache - an offline-first content library for quiz applications.
//!
//! This crate provides the data layer for a quiz app: a remote API client,
//! a local record store, a two-tier media cache, and the synchronizer that
//! decides when to serve persisted data and when to refetch. It has no UI
//! or process surface of its own; a host shell constructs the components
//! and drives them.
//!
//! Components:
//! - [`api`]: REST client for the countries and quiz endpoints, with a
//!   closed error taxonomy and a network-reachability handle
//! - [`store`]: typed, fail-soft-on-read record store persisted as JSON
//!   snapshots on disk
//! - [`cache`]: URL-keyed media cache with an in-memory LRU tier and a
//!   durable disk tier
//! - [`repository`]: the content synchronizer (store-is-truth for
//!   countries, network-is-truth for quiz content)
//! - [`session`]: per-question answer/timer/bookmark state for a running
//!   quiz
//!
//! Logging goes through `tracing`; the host is expected to install a
//! subscriber.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod repository;
pub mod session;
pub mod store;

pub use api::{ApiClient, ApiError, QuizDataSource, Reachability};
pub use cache::{MediaCache, MediaError};
pub use config::Config;
pub use models::{Country, QuestionKind, QuizQuestion, QuizSolution};
pub use repository::{QuizRepository, SyncError};
pub use session::QuizSession;
pub use store::{Query, Record, RecordStore, StoreError};
