use async_trait::async_trait;
use quiz_core::model::{QuestionDraft, SessionSet};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::{QuestionSource, SourceRequest};
use crate::error::SourceError;

/// Serves questions from a list compiled into, or loaded by, the application.
///
/// The bundle has no difficulty tiers, so the requested difficulty is ignored.
#[derive(Debug, Clone)]
pub struct BundledSource {
    drafts: Vec<QuestionDraft>,
    shuffle: bool,
}

impl BundledSource {
    #[must_use]
    pub fn new(drafts: Vec<QuestionDraft>) -> Self {
        Self {
            drafts,
            shuffle: false,
        }
    }

    /// The five built-in web basics questions.
    #[must_use]
    pub fn web_basics() -> Self {
        Self::new(vec![
            QuestionDraft::new(
                "What is the full form of HTML?",
                [
                    "Hello to my land",
                    "Hey text markup language",
                    "Hypertext markup language",
                    "Hypertext makeup language",
                ],
                2,
            ),
            QuestionDraft::new(
                "What is the full form of CSS?",
                [
                    "Cascading style sheets",
                    "Cascading style sheep",
                    "Cartoon style sheets",
                    "Cascading super sheets",
                ],
                0,
            ),
            QuestionDraft::new(
                "What is the full form of JS?",
                ["JavaScript", "JavaSuper", "JustScript", "JordenShoes"],
                0,
            ),
            QuestionDraft::new(
                "What is the full form of HTTP?",
                [
                    "Hypertext transfer product",
                    "Hypertext test protocol",
                    "Hey transfer protocol",
                    "Hypertext transfer protocol",
                ],
                3,
            ),
            QuestionDraft::new(
                "What is the full form of URL?",
                [
                    "Uniform resource locator",
                    "Uniform resource link",
                    "United resource locator",
                    "United resource link",
                ],
                0,
            ),
        ])
    }

    /// Load a bundle from a JSON array of `{ question, options, answer }` objects.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the document does not match that shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
        Ok(Self::new(drafts))
    }

    /// Shuffle question order on every fetch. Option order is never touched.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Take `count` questions, shuffling their order with `rng` when enabled.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::InsufficientQuestions` if the bundle is too small
    /// and `SourceError::InvalidRecord` if a bundled question is malformed.
    pub fn pick<R: Rng>(&self, count: usize, rng: &mut R) -> Result<SessionSet, SourceError> {
        if count > self.drafts.len() {
            return Err(SourceError::InsufficientQuestions {
                requested: count,
                available: Some(self.drafts.len()),
            });
        }

        let mut drafts = self.drafts.clone();
        if self.shuffle {
            drafts.shuffle(rng);
        }
        drafts.truncate(count);
        debug!(count, shuffled = self.shuffle, "picked bundled questions");

        Ok(SessionSet::from_drafts(drafts)?)
    }
}

#[async_trait]
impl QuestionSource for BundledSource {
    async fn fetch(&self, request: SourceRequest) -> Result<SessionSet, SourceError> {
        self.pick(request.count(), &mut rand::rng())
    }
}
