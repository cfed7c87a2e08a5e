//! Data models for quiz content.
//!
//! This module contains the stored domain records and the wire-format
//! response types they are mapped from:
//!
//! - `Country`: reference record, fetched once and kept
//! - `QuizQuestion`, `QuizSolution`: content records, replaced on sync
//! - `QuestionKind`: how question/solution content is interpreted
//! - `CountryResponse`, `QuizResponse`: remote API shapes

pub mod country;
pub mod quiz;

pub use country::{Country, CountryName, CountryResponse};
pub use quiz::{QuestionKind, QuizQuestion, QuizResponse, QuizSolution, SolutionResponse};
