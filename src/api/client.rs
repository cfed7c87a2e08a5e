//! API client for the quiz content and countries endpoints.
//!
//! This module provides the `QuizDataSource` trait - the seam the
//! synchronizer depends on - and the `ApiClient` implementation backed
//! by reqwest. Both endpoints are plain GETs returning JSON lists.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{CountryResponse, QuizResponse};

use super::{ApiError, Reachability};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Remote source of quiz and country data, plus live reachability state.
///
/// Implemented by `ApiClient` for production and by in-memory fakes in
/// tests; the synchronizer only ever sees this trait.
#[async_trait]
pub trait QuizDataSource: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<CountryResponse>, ApiError>;

    async fn fetch_quizzes(&self) -> Result<Vec<QuizResponse>, ApiError>;

    fn is_reachable(&self) -> bool;
}

/// API client for the quiz backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    countries_url: String,
    quiz_url: String,
    reachability: Reachability,
}

impl ApiClient {
    pub fn new(config: &Config, reachability: Reachability) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            countries_url: config.countries_url.clone(),
            quiz_url: config.quiz_url.clone(),
            reachability,
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        if !self.reachability.is_reachable() {
            warn!(url, "Skipping request while offline");
            return Err(ApiError::Unreachable);
        }

        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl QuizDataSource for ApiClient {
    async fn fetch_countries(&self) -> Result<Vec<CountryResponse>, ApiError> {
        self.get(&self.countries_url).await
    }

    async fn fetch_quizzes(&self) -> Result<Vec<QuizResponse>, ApiError> {
        self.get(&self.quiz_url).await
    }

    fn is_reachable(&self) -> bool {
        self.reachability.is_reachable()
    }
}
