//! Content synchronizer for countries and quiz content.
//!
//! Two pull operations with opposite freshness policies:
//!
//! - `sync_country_list`: store-is-truth. Once the countries table is
//!   populated the network is never consulted again.
//! - `sync_quiz_list`: network-is-truth. Every successful fetch wipes
//!   and replaces the stored content, then warms the media cache for
//!   any referenced images before returning the playable subset.
//!
//! Store read failures degrade to empty results; store write failures
//! and remote failures propagate to the caller unchanged.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, QuizDataSource};
use crate::cache::MediaCache;
use crate::models::{Country, QuestionKind, QuizQuestion, QuizSolution};
use crate::store::{Query, RecordStore, StoreError};

/// Maximum concurrent media prefetch downloads per sync.
/// Limits parallel requests to avoid overwhelming the server.
const MAX_CONCURRENT_PREFETCH: usize = 10;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The synchronizer. All collaborators are injected; construct one per
/// logical session.
pub struct QuizRepository {
    store: Arc<RecordStore>,
    api: Arc<dyn QuizDataSource>,
    media: Arc<MediaCache>,
}

impl QuizRepository {
    pub fn new(
        store: Arc<RecordStore>,
        api: Arc<dyn QuizDataSource>,
        media: Arc<MediaCache>,
    ) -> Self {
        Self { store, api, media }
    }

    /// Return the countries list, fetching it from the network only if
    /// the local table is empty.
    ///
    /// On a first-time fetch the mapped records are persisted and then
    /// re-read, so callers always hold store-backed identities.
    pub async fn sync_country_list(&self) -> Result<Vec<Country>, SyncError> {
        let saved = self.saved_countries().await;
        if !saved.is_empty() {
            debug!(count = saved.len(), "Returning cached countries");
            return Ok(saved);
        }

        let remote = self.api.fetch_countries().await?;
        let records: Vec<Country> = remote.iter().map(Country::from_response).collect();
        self.store.save(&records).await?;
        info!(count = records.len(), "Countries saved to store");

        Ok(self.saved_countries().await)
    }

    /// Return the playable quiz list.
    ///
    /// Offline this serves the locally stored, validity-filtered set and
    /// raises no error. Online it replaces the stored content with the
    /// remote payload, prefetches referenced images (joined before
    /// returning), and re-reads the playable subset.
    pub async fn sync_quiz_list(&self) -> Result<Vec<QuizQuestion>, SyncError> {
        if !self.api.is_reachable() {
            info!("No network, serving cached quizzes");
            return Ok(self.valid_quizzes().await);
        }

        let remote = self.api.fetch_quizzes().await?;

        // Bookmarks ride across the wipe on stable remote uuids.
        let bookmarked: HashSet<Uuid> = self
            .store
            .fetch(Query::<QuizQuestion>::new().filter(|q| q.has_bookmarked))
            .await
            .into_iter()
            .filter_map(|q| q.uuid)
            .collect();

        self.store.delete_all::<QuizQuestion>().await?;
        self.store.delete_all::<QuizSolution>().await?;

        let mut questions = Vec::with_capacity(remote.len());
        let mut solutions = Vec::new();
        for response in &remote {
            let (mut question, solution) = QuizQuestion::from_response(response);
            if question.uuid.is_some_and(|u| bookmarked.contains(&u)) {
                question.has_bookmarked = true;
            }
            questions.push(question);
            if let Some(solution) = solution {
                solutions.push(solution);
            }
        }

        self.store.save(&questions).await?;
        self.store.save(&solutions).await?;
        info!(
            questions = questions.len(),
            solutions = solutions.len(),
            "Quiz content replaced"
        );

        self.prefetch_media().await;

        Ok(self.valid_quizzes().await)
    }

    /// Locally bookmarked questions, no network involved.
    pub async fn fetch_bookmarked(&self) -> Vec<QuizQuestion> {
        self.quizzes_with_solutions(
            Query::<QuizQuestion>::new()
                .filter(|q| q.has_bookmarked)
                .sort_by(|a, b| a.sort.cmp(&b.sort)),
        )
        .await
    }

    async fn saved_countries(&self) -> Vec<Country> {
        self.store
            .fetch(Query::<Country>::new().sort_by(|a, b| a.name.cmp(&b.name)))
            .await
    }

    /// Concurrently warm the media cache for every image-bearing
    /// question and solution. Individual failures are logged and
    /// swallowed; the whole fan-out is joined before returning.
    async fn prefetch_media(&self) {
        let image_questions = self
            .store
            .fetch(Query::<QuizQuestion>::new().filter(|q| q.kind == QuestionKind::Image))
            .await;
        let image_solutions = self
            .store
            .fetch(Query::<QuizSolution>::new().filter(|s| s.kind == QuestionKind::Image))
            .await;
        debug!(
            questions = image_questions.len(),
            solutions = image_solutions.len(),
            "Prefetching referenced images"
        );

        let urls: Vec<String> = image_questions
            .into_iter()
            .map(|q| q.question)
            .chain(image_solutions.into_iter().map(|s| s.content_data))
            .filter(|url| !url.is_empty())
            .collect();

        stream::iter(urls)
            .for_each_concurrent(MAX_CONCURRENT_PREFETCH, |url| {
                let media = Arc::clone(&self.media);
                async move {
                    if let Err(e) = media.fetch_and_cache(&url).await {
                        warn!(url = %url, error = %e, "Image prefetch failed");
                    }
                }
            })
            .await;
    }

    async fn valid_quizzes(&self) -> Vec<QuizQuestion> {
        let mut questions = self
            .quizzes_with_solutions(
                Query::<QuizQuestion>::new().sort_by(|a, b| a.sort.cmp(&b.sort)),
            )
            .await;
        questions.retain(QuizQuestion::is_playable);
        questions
    }

    /// Fetch questions and hydrate each with its owned solution.
    async fn quizzes_with_solutions(&self, query: Query<QuizQuestion>) -> Vec<QuizQuestion> {
        let solutions = self.store.fetch(Query::<QuizSolution>::new()).await;
        let mut by_quiz: HashMap<Uuid, QuizSolution> =
            solutions.into_iter().map(|s| (s.quiz_id, s)).collect();

        let mut questions = self.store.fetch(query).await;
        for question in &mut questions {
            question.solution = by_quiz.remove(&question.id);
        }
        questions
    }
}

// ============================================================================
// Tests
// ============================================================================
