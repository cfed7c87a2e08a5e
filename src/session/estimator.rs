use crate::models::{QuestionKind, QuizQuestion};

/// Fixed time budget for questions whose length says nothing about
/// reading effort (images), in seconds.
pub const DEFAULT_QUESTION_SECONDS: u32 = 60;

/// Base thinking time granted regardless of question length.
const BASE_SECONDS: f64 = 12.0;

/// Reading cost per word.
const SECONDS_PER_WORD: f64 = 0.4;

/// Extra cost per character of average word length.
const SECONDS_PER_AVG_CHAR: f64 = 0.9;

/// Bounds for an estimated budget, in seconds.
const MIN_SECONDS: u32 = 15;
const MAX_SECONDS: u32 = 180;

/// Estimates how long a question should stay on the clock.
///
/// Text-like questions get a linear model over word count and average
/// word length; anything else gets the fixed default.
#[derive(Debug, Default)]
pub struct DurationEstimator;

impl DurationEstimator {
    pub fn estimate(&self, question: &QuizQuestion) -> u32 {
        match question.kind {
            QuestionKind::Text | QuestionKind::RichText => Self::estimate_text(&question.question),
            QuestionKind::Image => DEFAULT_QUESTION_SECONDS,
        }
    }

    fn estimate_text(text: &str) -> u32 {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return DEFAULT_QUESTION_SECONDS;
        }

        let word_count = words.len() as f64;
        let average_word_length =
            words.iter().map(|w| w.chars().count() as f64).sum::<f64>() / word_count;

        let estimate =
            BASE_SECONDS + word_count * SECONDS_PER_WORD + average_word_length * SECONDS_PER_AVG_CHAR;
        (estimate.round() as u32).clamp(MIN_SECONDS, MAX_SECONDS)
    }
}
