// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Record;

/// How a question's `question` field (or a solution's `content_data`)
/// should be interpreted: plain text, rich markup, or a media URL.
///
/// The wire value `"htmlText"` is accepted as a legacy spelling of
/// `richText`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    #[default]
    Text,
    #[serde(alias = "htmlText")]
    RichText,
    Image,
}

/// A quiz question record.
///
/// The whole question set is wiped and replaced on every successful sync
/// (network-is-truth). `id` is local store identity; `uuid` is the remote
/// identity used to carry bookmarks across a resync. The answer/skip/
/// bookmark flags are session-local state; only the bookmark is written
/// back to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub uuid: Option<Uuid>,
    pub question: String,
    pub kind: QuestionKind,
    pub option1: String,
    pub option2: String,
    pub option3: String,
    pub option4: String,
    /// 0-based index of the correct option; -1 when the remote value was absent.
    pub correct_option: i32,
    pub sort: i32,
    pub has_answered: bool,
    pub has_skipped: bool,
    pub has_bookmarked: bool,
    pub selected_option: Option<i32>,
    /// Owned solution, hydrated from the solutions table on read.
    #[serde(skip)]
    pub solution: Option<QuizSolution>,
}

impl QuizQuestion {
    /// Map a remote record into a stored question plus its owned solution.
    ///
    /// The 1-based remote `correctOption` is normalized to 0-based here and
    /// nowhere else.
    pub fn from_response(response: &QuizResponse) -> (Self, Option<QuizSolution>) {
        let id = Uuid::new_v4();
        let uuid = response
            .uuid_identifier
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok());

        let solution = response
            .solution
            .as_ref()
            .and_then(|entries| entries.first())
            .map(|entry| QuizSolution {
                id: Uuid::new_v4(),
                quiz_id: id,
                kind: entry.content_type.unwrap_or_default(),
                content_data: entry.content_data.clone().unwrap_or_default(),
                downloaded: false,
            });

        let question = Self {
            id,
            uuid,
            question: response.question.clone().unwrap_or_default(),
            kind: response.question_type.unwrap_or_default(),
            option1: response.option1.clone().unwrap_or_default(),
            option2: response.option2.clone().unwrap_or_default(),
            option3: response.option3.clone().unwrap_or_default(),
            option4: response.option4.clone().unwrap_or_default(),
            correct_option: response.correct_option.unwrap_or(0) - 1,
            sort: response.sort.unwrap_or(0),
            has_answered: false,
            has_skipped: false,
            has_bookmarked: false,
            selected_option: None,
            solution: solution.clone(),
        };

        (question, solution)
    }

    /// Whether this question has enough data to be presented in a session:
    /// non-empty question text, four non-empty options, an in-range correct
    /// index, and a solution with content.
    pub fn is_playable(&self) -> bool {
        !self.question.is_empty()
            && !self.option1.is_empty()
            && !self.option2.is_empty()
            && !self.option3.is_empty()
            && !self.option4.is_empty()
            && (0..=3).contains(&self.correct_option)
            && self
                .solution
                .as_ref()
                .is_some_and(|s| !s.content_data.is_empty())
    }

    /// The four options in display order.
    pub fn options(&self) -> [&str; 4] {
        [&self.option1, &self.option2, &self.option3, &self.option4]
    }
}

impl Record for QuizQuestion {
    const TABLE: &'static str = "quiz_questions";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// The solution attached to exactly one question; wiped with its owner.
///
/// `downloaded` is a hint for hosts that surface offline-media state; it
/// is not consulted by the cache itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSolution {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub kind: QuestionKind,
    pub content_data: String,
    pub downloaded: bool,
}

impl Record for QuizSolution {
    const TABLE: &'static str = "quiz_solutions";

    fn id(&self) -> Uuid {
        self.id
    }
}

// API response types

/// Wire shape of one entry in the quiz content response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    #[serde(rename = "uuid", alias = "uuidIdentifier")]
    pub uuid_identifier: Option<String>,
    #[serde(rename = "questionType")]
    pub question_type: Option<QuestionKind>,
    pub question: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    /// 1-based on the wire.
    #[serde(rename = "correctOption")]
    pub correct_option: Option<i32>,
    pub sort: Option<i32>,
    #[serde(default)]
    pub solution: Option<Vec<SolutionResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionResponse {
    #[serde(rename = "contentType")]
    pub content_type: Option<QuestionKind>,
    #[serde(rename = "contentData")]
    pub content_data: Option<String>,
}
