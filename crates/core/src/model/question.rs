use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("a question needs at least 2 options, got {count}")]
    TooFewOptions { count: usize },

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("answer index {answer_index} is out of range for {count} options")]
    AnswerOutOfRange { answer_index: usize, count: usize },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as it arrives from a bundle, a fixture or a remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "answer")]
    pub answer_index: usize,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        answer_index: usize,
    ) -> Self {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            answer_index,
        }
    }

    /// Validate the draft into an immutable `QuestionRecord`.
    ///
    /// Question and option text is trimmed. Option order is kept as given.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than two
    /// options, an option is blank, or the answer index does not point at an option.
    pub fn validate(self) -> Result<QuestionRecord, QuestionError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(QuestionError::EmptyQuestion);
        }

        let count = self.options.len();
        if count < 2 {
            return Err(QuestionError::TooFewOptions { count });
        }

        let mut options = Vec::with_capacity(count);
        for (index, option) in self.options.iter().enumerate() {
            let option = option.trim();
            if option.is_empty() {
                return Err(QuestionError::EmptyOption { index });
            }
            options.push(option.to_owned());
        }

        if self.answer_index >= count {
            return Err(QuestionError::AnswerOutOfRange {
                answer_index: self.answer_index,
                count,
            });
        }

        Ok(QuestionRecord {
            question: question.to_owned(),
            options,
            answer_index: self.answer_index,
        })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// `answer_index` always points into `options`, and the option order is fixed
/// for the lifetime of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionDraft")]
pub struct QuestionRecord {
    question: String,
    options: Vec<String>,
    answer_index: usize,
}

impl QuestionRecord {
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.answer_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.answer_index]
    }
}

impl TryFrom<QuestionDraft> for QuestionRecord {
    type Error = QuestionError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}
