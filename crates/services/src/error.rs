//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{ParseDifficultyError, SessionSetError};
use storage::repository::StorageError;

/// Errors raised while reading or validating configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("{var} must be on or off, got {raw:?}")]
    InvalidFlag { var: &'static str, raw: String },
    #[error("seconds per question must be > 0")]
    ZeroSeconds,
    #[error("question count must be > 0")]
    ZeroCount,
    #[error("high score key cannot be empty")]
    EmptyHighScoreKey,
    #[error("unknown restart policy: {0}")]
    RestartPolicy(String),
    #[error(transparent)]
    Difficulty(#[from] ParseDifficultyError),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

fn found_suffix(available: &Option<usize>) -> String {
    available.map(|n| format!(", found {n}")).unwrap_or_default()
}

/// Errors emitted by question sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("not enough questions available: requested {requested}{}", found_suffix(.available))]
    InsufficientQuestions {
        requested: usize,
        available: Option<usize>,
    },
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    #[error("question source request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("question source returned an invalid question: {0}")]
    InvalidRecord(#[from] SessionSetError),
}

/// Errors emitted by `ScoreBoard`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoreBoardError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// User-facing category of a session error, so each can be presented distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad question set or settings; not retryable as is.
    Configuration,
    /// Fewer questions than requested; retry with other parameters.
    InsufficientQuestions,
    /// Network or service failure; retry later.
    SourceUnavailable,
    /// High-score persistence failed.
    Storage,
}

/// Errors emitted by `SessionController`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid question set: {0}")]
    Configuration(#[from] SessionSetError),
    #[error("no session to restart")]
    NoSession,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    ScoreBoard(#[from] ScoreBoardError),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Configuration(_) | SessionError::NoSession => {
                ErrorKind::Configuration
            }
            SessionError::Source(SourceError::InsufficientQuestions { .. }) => {
                ErrorKind::InsufficientQuestions
            }
            SessionError::Source(_) => ErrorKind::SourceUnavailable,
            SessionError::ScoreBoard(_) => ErrorKind::Storage,
        }
    }
}
