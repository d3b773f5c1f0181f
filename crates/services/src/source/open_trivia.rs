use std::env;

use async_trait::async_trait;
use quiz_core::model::{Difficulty, QuestionDraft, SessionSet};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::entities::decode_html_entities;
use super::{QuestionSource, SourceRequest};
use crate::error::{ConfigError, SourceError};

const DEFAULT_BASE_URL: &str = "https://opentdb.com/";

#[derive(Clone, Debug)]
pub struct OpenTriviaConfig {
    pub base_url: Url,
    pub category: Option<u32>,
}

impl Default for OpenTriviaConfig {
    /// Points at the public Open Trivia DB with no category filter.
    ///
    /// # Panics
    ///
    /// Panics if `DEFAULT_BASE_URL` is not a valid URL, which the
    /// `builds_query_for_request` test rules out.
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default trivia URL should be valid"),
            category: None,
        }
    }
}

impl OpenTriviaConfig {
    /// Read `QUIZ_TRIVIA_BASE_URL` and `QUIZ_TRIVIA_CATEGORY`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("QUIZ_TRIVIA_BASE_URL") {
            config.base_url = Url::parse(raw.trim())?;
        }
        if let Ok(raw) = env::var("QUIZ_TRIVIA_CATEGORY") {
            config.category = Some(crate::config::parse_positive(
                "QUIZ_TRIVIA_CATEGORY",
                &raw,
            )?);
        }
        Ok(config)
    }
}

/// Fetches multiple-choice questions from an Open Trivia DB compatible API.
#[derive(Clone)]
pub struct OpenTriviaSource {
    client: Client,
    config: OpenTriviaConfig,
}

impl OpenTriviaSource {
    #[must_use]
    pub fn new(config: OpenTriviaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the environment holds invalid values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(OpenTriviaConfig::from_env()?))
    }

    /// Build the request URL for `request`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Unavailable` if the configured base URL cannot be joined.
    pub fn request_url(&self, request: SourceRequest) -> Result<Url, SourceError> {
        let mut url = self
            .config
            .base_url
            .join("api.php")
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("amount", &request.count().to_string());
            query.append_pair("type", "multiple");
            if request.difficulty() != Difficulty::Any {
                query.append_pair("difficulty", request.difficulty().as_str());
            }
            if let Some(category) = self.config.category {
                query.append_pair("category", &category.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl QuestionSource for OpenTriviaSource {
    async fn fetch(&self, request: SourceRequest) -> Result<SessionSet, SourceError> {
        let url = self.request_url(request)?;
        debug!(%url, "fetching trivia questions");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "trivia service returned an error status");
            return Err(SourceError::HttpStatus(response.status()));
        }

        let body: TriviaResponse = response.json().await?;
        body.into_session_set(request, &mut rand::rng())
    }
}

/// Response envelope of the trivia API.
#[derive(Debug, Deserialize)]
pub struct TriviaResponse {
    pub response_code: u8,
    #[serde(default)]
    pub results: Vec<TriviaQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct TriviaQuestion {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl TriviaResponse {
    /// Map the response code and normalize every result into a validated set.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InsufficientQuestions` when the service has too few
    /// questions for the request, `SourceError::Unavailable` for any other
    /// non-zero code, and `SourceError::InvalidRecord` for malformed results.
    pub fn into_session_set<R: Rng>(
        self,
        request: SourceRequest,
        rng: &mut R,
    ) -> Result<SessionSet, SourceError> {
        match self.response_code {
            0 => {}
            1 => {
                return Err(SourceError::InsufficientQuestions {
                    requested: request.count(),
                    available: None,
                });
            }
            2 => return Err(SourceError::Unavailable("invalid request parameter".into())),
            5 => return Err(SourceError::Unavailable("rate limited".into())),
            code => return Err(SourceError::Unavailable(format!("response code {code}"))),
        }

        if self.results.len() < request.count() {
            return Err(SourceError::InsufficientQuestions {
                requested: request.count(),
                available: Some(self.results.len()),
            });
        }

        let drafts: Vec<_> = self
            .results
            .into_iter()
            .take(request.count())
            .map(|question| question.into_draft(rng))
            .collect();
        Ok(SessionSet::from_drafts(drafts)?)
    }
}

impl TriviaQuestion {
    /// Decode entities and insert the correct answer at a random position.
    pub fn into_draft<R: Rng>(self, rng: &mut R) -> QuestionDraft {
        let mut options: Vec<String> = self
            .incorrect_answers
            .iter()
            .map(|answer| decode_html_entities(answer))
            .collect();
        let answer_index = rng.random_range(0..=options.len());
        options.insert(answer_index, decode_html_entities(&self.correct_answer));

        QuestionDraft {
            question: decode_html_entities(&self.question),
            options,
            answer_index,
        }
    }
}
