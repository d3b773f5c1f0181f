use std::ops::Index;

use thiserror::Error;

use crate::model::question::{QuestionDraft, QuestionError, QuestionRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSetError {
    #[error("a session needs at least one question")]
    Empty,

    #[error("question {position} is invalid: {source}")]
    InvalidQuestion {
        position: usize,
        #[source]
        source: QuestionError,
    },
}

/// The ordered, non-empty list of questions bound to one session.
///
/// Immutable once built; sessions share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSet {
    questions: Vec<QuestionRecord>,
}

impl SessionSet {
    /// Build a set from already validated records.
    ///
    /// # Errors
    ///
    /// Returns `SessionSetError::Empty` if no records are given.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, SessionSetError> {
        if questions.is_empty() {
            return Err(SessionSetError::Empty);
        }
        Ok(Self { questions })
    }

    /// Validate a list of drafts and build a set from them.
    ///
    /// # Errors
    ///
    /// Returns `SessionSetError::InvalidQuestion` for the first draft that fails
    /// validation, or `SessionSetError::Empty` if the list is empty.
    pub fn from_drafts(
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Self, SessionSetError> {
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| {
                draft
                    .validate()
                    .map_err(|source| SessionSetError::InvalidQuestion { position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false; kept for API symmetry with collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&QuestionRecord> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionRecord> {
        self.questions.iter()
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }
}

impl Index<usize> for SessionSet {
    type Output = QuestionRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.questions[index]
    }
}

impl TryFrom<Vec<QuestionRecord>> for SessionSet {
    type Error = SessionSetError;

    fn try_from(questions: Vec<QuestionRecord>) -> Result<Self, Self::Error> {
        Self::new(questions)
    }
}
