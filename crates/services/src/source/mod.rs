//! Question sources: where a session's questions come from.

mod bundled;
mod entities;
mod open_trivia;

use async_trait::async_trait;
use quiz_core::model::{Difficulty, SessionSet};

use crate::error::{ConfigError, SourceError};

pub use bundled::BundledSource;
pub use entities::decode_html_entities;
pub use open_trivia::{OpenTriviaConfig, OpenTriviaSource, TriviaQuestion, TriviaResponse};

/// Parameters for fetching one session's worth of questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRequest {
    count: usize,
    difficulty: Difficulty,
}

impl SourceRequest {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCount` if `count` is zero.
    pub fn new(count: usize, difficulty: Difficulty) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        Ok(Self { count, difficulty })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

/// Supplies a validated `SessionSet` for a request.
///
/// Implementations must report a shortage as `SourceError::InsufficientQuestions`
/// and keep it distinct from transport or service failures.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch exactly `request.count()` questions.
    ///
    /// # Errors
    ///
    /// Returns `SourceError` when the questions cannot be supplied.
    async fn fetch(&self, request: SourceRequest) -> Result<SessionSet, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_request_is_rejected() {
        assert!(matches!(
            SourceRequest::new(0, Difficulty::Any),
            Err(ConfigError::ZeroCount)
        ));
        let request = SourceRequest::new(3, Difficulty::Easy).unwrap();
        assert_eq!(request.count(), 3);
        assert_eq!(request.difficulty(), Difficulty::Easy);
    }
}
