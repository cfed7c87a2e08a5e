//! REST API client module for the quiz backend.
//!
//! This module provides the `QuizDataSource` seam and its `ApiClient`
//! implementation for fetching the countries reference list and the quiz
//! content list, the closed `ApiError` taxonomy both endpoints report
//! through, and the `Reachability` handle the host shell feeds from its
//! platform network monitor.

pub mod client;
pub mod error;
pub mod reachability;

pub use client::{ApiClient, QuizDataSource};
pub use error::ApiError;
pub use reachability::Reachability;
