//! Quiz session state management.
//!
//! This module provides the `QuizSession` state machine over a fixed
//! question list (answers, per-question countdowns, bookmarks,
//! navigation, scoring) and the `DurationEstimator` that sets each
//! question's initial time budget.

pub mod estimator;
pub mod state;

pub use estimator::{DurationEstimator, DEFAULT_QUESTION_SECONDS};
pub use state::{ItemState, QuizSession};
