use async_trait::async_trait;
use quiz_core::HighScore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the persisted best-ever score.
///
/// Scores are stored under a caller-chosen key so independent quizzes do not
/// overwrite each other.
#[async_trait]
pub trait HighScoreRepository: Send + Sync {
    /// Read the stored best score, or `HighScore::default()` (0) when none exists.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_high_score(&self, key: &str) -> Result<HighScore, StorageError>;

    /// Overwrite the stored best score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set_high_score(&self, key: &str, score: u32) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    high_scores: Arc<Mutex<HashMap<String, u32>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            high_scores: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Repository pre-seeded with a stored score.
    #[must_use]
    pub fn with_high_score(key: &str, score: u32) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.high_scores.lock() {
            guard.insert(key.to_owned(), score);
        }
        repo
    }

    /// Raw stored value, `None` when nothing was written under `key`.
    #[must_use]
    pub fn stored(&self, key: &str) -> Option<u32> {
        self.high_scores
            .lock()
            .ok()
            .and_then(|guard| guard.get(key).copied())
    }
}

#[async_trait]
impl HighScoreRepository for InMemoryRepository {
    async fn get_high_score(&self, key: &str) -> Result<HighScore, StorageError> {
        let guard = self
            .high_scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(HighScore::from(guard.get(key).copied()))
    }

    async fn set_high_score(&self, key: &str, score: u32) -> Result<(), StorageError> {
        let mut guard = self
            .high_scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), score);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub high_scores: Arc<dyn HighScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let high_scores: Arc<dyn HighScoreRepository> = Arc::new(InMemoryRepository::new());
        Self { high_scores }
    }
}
