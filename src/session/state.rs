//! Per-session quiz state.
//!
//! A `QuizSession` runs over a fixed, validity-filtered question list.
//! All per-question state (answer, countdown, bookmark) lives in one
//! owned slot per question; navigation snapshots and restores it, so
//! revisiting a question brings back its exact remaining time and any
//! submitted answer.

use std::sync::Arc;

use tracing::debug;

use crate::models::QuizQuestion;
use crate::store::{RecordStore, StoreError};

use super::DurationEstimator;

/// State for one question, keyed by its position in the session.
#[derive(Debug, Clone)]
pub struct ItemState {
    pub selected_option: Option<i32>,
    pub answered: bool,
    pub timed_out: bool,
    pub bookmarked: bool,
    pub remaining_seconds: u32,
}

/// A running quiz over an ordered question list.
///
/// Answering is terminal per question; the bookmark toggle is orthogonal
/// and written through to the store immediately. The countdown only
/// moves on [`tick`](QuizSession::tick), which the host drives once per
/// second of wall clock.
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    states: Vec<ItemState>,
    current_index: usize,
    max_index_reached: usize,
    timer_paused: bool,
    store: Arc<RecordStore>,
    estimator: DurationEstimator,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>, store: Arc<RecordStore>) -> Self {
        let estimator = DurationEstimator;
        let states = questions
            .iter()
            .map(|question| ItemState {
                selected_option: None,
                answered: false,
                timed_out: false,
                bookmarked: question.has_bookmarked,
                remaining_seconds: estimator.estimate(question),
            })
            .collect();

        let mut session = Self {
            questions,
            states,
            current_index: 0,
            max_index_reached: 0,
            timer_paused: false,
            store,
            estimator,
        };
        session.load_current_state();
        session
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Highest index ever visited, for progress reporting.
    pub fn max_index_reached(&self) -> usize {
        self.max_index_reached
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn item_state(&self, index: usize) -> Option<&ItemState> {
        self.states.get(index)
    }

    /// Remaining seconds on the current question's clock.
    pub fn remaining_seconds(&self) -> u32 {
        self.states
            .get(self.current_index)
            .map_or(0, |state| state.remaining_seconds)
    }

    /// Whether further input is rejected for the current question.
    pub fn is_input_disabled(&self) -> bool {
        self.states
            .get(self.current_index)
            .is_some_and(|state| state.answered || state.timed_out)
    }

    pub fn is_timer_paused(&self) -> bool {
        self.timer_paused
    }

    /// Submit an answer for the current question. Terminal: later calls
    /// for the same question are ignored, as is input after a timeout.
    pub fn select_answer(&mut self, option: i32) {
        let index = self.current_index;
        let Some(state) = self.states.get_mut(index) else {
            return;
        };
        if state.answered || state.timed_out {
            return;
        }

        state.selected_option = Some(option);
        state.answered = true;
        self.timer_paused = true;

        let question = &mut self.questions[index];
        question.selected_option = Some(option);
        question.has_answered = true;
    }

    /// Advance the countdown by one second of wall clock. Hitting zero
    /// auto-submits the question as a timeout and disables its input.
    pub fn tick(&mut self) {
        if self.timer_paused {
            return;
        }
        let index = self.current_index;
        let Some(state) = self.states.get_mut(index) else {
            return;
        };
        if state.answered || state.timed_out || state.remaining_seconds == 0 {
            return;
        }

        state.remaining_seconds -= 1;
        if state.remaining_seconds == 0 {
            state.timed_out = true;
            self.timer_paused = true;
            self.questions[index].has_skipped = true;
            debug!(index, "Question timed out");
        }
    }

    pub fn next(&mut self) {
        if self.current_index + 1 >= self.questions.len() {
            return;
        }
        self.move_to(self.current_index + 1);
    }

    pub fn previous(&mut self) {
        if self.current_index == 0 {
            return;
        }
        self.move_to(self.current_index - 1);
    }

    fn move_to(&mut self, index: usize) {
        // The outgoing question's remaining time already lives in its
        // state slot; pausing is enough of a snapshot.
        self.timer_paused = true;
        self.current_index = index;
        if index > self.max_index_reached {
            self.max_index_reached = index;
        }
        self.load_current_state();
    }

    /// Restore the incoming question's state: the timer resumes only if
    /// it is unanswered, not timed out, and has time left.
    fn load_current_state(&mut self) {
        let Some(state) = self.states.get(self.current_index) else {
            self.timer_paused = true;
            return;
        };
        self.timer_paused = state.answered || state.timed_out || state.remaining_seconds == 0;
    }

    /// Flip the current question's bookmark and persist it immediately.
    /// Returns the new bookmark state.
    pub async fn toggle_bookmark(&mut self) -> Result<bool, StoreError> {
        let index = self.current_index;
        let Some(state) = self.states.get_mut(index) else {
            return Ok(false);
        };
        state.bookmarked = !state.bookmarked;

        let question = &mut self.questions[index];
        question.has_bookmarked = state.bookmarked;
        self.store.save(&[question.clone()]).await?;
        Ok(state.bookmarked)
    }

    /// Indices of currently bookmarked questions.
    pub fn bookmarked_indices(&self) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.bookmarked)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn total_correct(&self) -> usize {
        self.states
            .iter()
            .zip(&self.questions)
            .filter(|(state, question)| state.selected_option == Some(question.correct_option))
            .count()
    }

    pub fn score_percentage(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        self.total_correct() as f64 / self.questions.len() as f64 * 100.0
    }

    /// Feedback line for the current question once an answer is in:
    /// correctness verdict plus the solution content.
    pub fn solution_text(&self) -> String {
        let Some(question) = self.questions.get(self.current_index) else {
            return String::new();
        };
        let Some(state) = self.states.get(self.current_index) else {
            return String::new();
        };
        let Some(selected) = state.selected_option else {
            return String::new();
        };

        let correctness = if selected == question.correct_option {
            "Correct!"
        } else {
            "Incorrect!"
        };
        let detail = question
            .solution
            .as_ref()
            .map(|s| s.content_data.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("No solution available.");
        format!("{} {}", correctness, detail)
    }

    /// Rewind to a freshly-constructed session: first question, cleared
    /// answers and timers, bookmarks re-derived from the records.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.max_index_reached = 0;

        for (question, state) in self.questions.iter_mut().zip(&mut self.states) {
            question.has_answered = false;
            question.has_skipped = false;
            question.selected_option = None;
            *state = ItemState {
                selected_option: None,
                answered: false,
                timed_out: false,
                bookmarked: question.has_bookmarked,
                remaining_seconds: self.estimator.estimate(question),
            };
        }

        self.timer_paused = false;
        self.load_current_state();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::models::{QuestionKind, QuizSolution};
    use crate::store::Query;

    fn question(text: &str, correct: i32) -> QuizQuestion {
        let id = Uuid::new_v4();
        QuizQuestion {
            id,
            uuid: Some(Uuid::new_v4()),
            question: text.to_string(),
            kind: QuestionKind::Text,
            option1: "A".to_string(),
            option2: "B".to_string(),
            option3: "C".to_string(),
            option4: "D".to_string(),
            correct_option: correct,
            sort: 0,
            has_answered: false,
            has_skipped: false,
            has_bookmarked: false,
            selected_option: None,
            solution: Some(QuizSolution {
                id: Uuid::new_v4(),
                quiz_id: id,
                kind: QuestionKind::Text,
                content_data: "Because.".to_string(),
                downloaded: false,
            }),
        }
    }

    fn session_with(questions: Vec<QuizQuestion>) -> (tempfile::TempDir, QuizSession) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().to_path_buf()).unwrap());
        (dir, QuizSession::new(questions, store))
    }

    #[tokio::test]
    async fn test_answer_and_remaining_time_survive_navigation() {
        let (_dir, mut session) = session_with(vec![
            question("One", 0),
            question("Two", 1),
            question("Three", 2),
        ]);

        session.next(); // now on question 2 (index 1)
        let initial = session.remaining_seconds();
        session.tick();
        session.tick();
        session.tick();
        session.select_answer(1);

        session.next();
        session.previous(); // back to question 2

        assert_eq!(session.remaining_seconds(), initial - 3);
        assert_eq!(session.item_state(1).unwrap().selected_option, Some(1));
        assert!(session.is_input_disabled());
    }

    #[tokio::test]
    async fn test_answering_is_terminal() {
        let (_dir, mut session) = session_with(vec![question("One", 0)]);

        session.select_answer(2);
        session.select_answer(0); // ignored

        assert_eq!(session.item_state(0).unwrap().selected_option, Some(2));
        assert_eq!(session.total_correct(), 0);
    }

    #[tokio::test]
    async fn test_timeout_auto_submits_and_disables_input() {
        let (_dir, mut session) = session_with(vec![question("One", 0)]);

        let budget = session.remaining_seconds();
        for _ in 0..budget {
            session.tick();
        }

        assert_eq!(session.remaining_seconds(), 0);
        assert!(session.is_input_disabled());
        assert!(session.item_state(0).unwrap().timed_out);
        assert!(session.current_question().unwrap().has_skipped);

        // Late input and further ticks are ignored.
        session.select_answer(0);
        session.tick();
        assert!(session.item_state(0).unwrap().selected_option.is_none());
        assert_eq!(session.total_correct(), 0);
    }

    #[tokio::test]
    async fn test_paused_timer_does_not_decrement() {
        let (_dir, mut session) = session_with(vec![question("One", 0), question("Two", 0)]);

        let initial = session.remaining_seconds();
        session.select_answer(0);
        session.tick();
        session.tick();
        assert_eq!(session.remaining_seconds(), initial);
    }

    #[tokio::test]
    async fn test_navigation_clamps_and_tracks_progress() {
        let (_dir, mut session) = session_with(vec![
            question("One", 0),
            question("Two", 0),
            question("Three", 0),
        ]);

        session.previous(); // already at the start
        assert_eq!(session.current_index(), 0);

        session.next();
        session.next();
        session.next(); // already at the end
        assert_eq!(session.current_index(), 2);
        assert_eq!(session.max_index_reached(), 2);

        session.previous();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.max_index_reached(), 2);
    }

    #[tokio::test]
    async fn test_score_percentage() {
        let questions: Vec<QuizQuestion> = (0..5).map(|i| question(&format!("Q{}", i), 0)).collect();
        let (_dir, mut session) = session_with(questions);

        // Four right, one wrong: 80%.
        for i in 0..5 {
            session.select_answer(if i == 4 { 3 } else { 0 });
            session.next();
        }

        assert_eq!(session.total_correct(), 4);
        assert!((session.score_percentage() - 80.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_toggle_bookmark_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::open(dir.path().to_path_buf()).unwrap());
        let questions = vec![question("One", 0), question("Two", 0)];
        store.save(&questions).await.unwrap();

        let mut session = QuizSession::new(questions, store.clone());
        assert!(session.toggle_bookmark().await.unwrap());
        assert_eq!(session.bookmarked_indices(), vec![0]);

        let flagged = store
            .fetch(Query::<QuizQuestion>::new().filter(|q| q.has_bookmarked))
            .await;
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].question, "One");

        assert!(!session.toggle_bookmark().await.unwrap());
        let flagged = store
            .fetch(Query::<QuizQuestion>::new().filter(|q| q.has_bookmarked))
            .await;
        assert!(flagged.is_empty());
    }

    #[tokio::test]
    async fn test_solution_text_reports_correctness() {
        let (_dir, mut session) = session_with(vec![question("One", 1)]);

        assert_eq!(session.solution_text(), "");

        session.select_answer(1);
        assert_eq!(session.solution_text(), "Correct! Because.");

        session.reset();
        session.select_answer(0);
        assert_eq!(session.solution_text(), "Incorrect! Because.");
    }

    #[tokio::test]
    async fn test_reset_restores_fresh_state() {
        let (_dir, mut session) = session_with(vec![question("One", 0), question("Two", 0)]);

        let initial = session.remaining_seconds();
        session.tick();
        session.select_answer(0);
        session.next();

        session.reset();

        assert_eq!(session.current_index(), 0);
        assert_eq!(session.max_index_reached(), 0);
        assert_eq!(session.remaining_seconds(), initial);
        assert!(!session.is_input_disabled());
        assert_eq!(session.total_correct(), 0);
        assert!(!session.is_timer_paused());
    }

    #[tokio::test]
    async fn test_empty_session_is_inert() {
        let (_dir, mut session) = session_with(Vec::new());

        session.tick();
        session.next();
        session.previous();
        session.select_answer(0);

        assert!(session.is_empty());
        assert!(session.current_question().is_none());
        assert_eq!(session.remaining_seconds(), 0);
        assert_eq!(session.score_percentage(), 0.0);
        assert!(!session.toggle_bookmark().await.unwrap());
    }
}
