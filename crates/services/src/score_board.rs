use std::sync::Arc;

use quiz_core::{FinalReport, HighScore};
use storage::repository::HighScoreRepository;
use tracing::info;

use crate::error::ScoreBoardError;

/// Applies the high-score rule against persisted storage.
#[derive(Clone)]
pub struct ScoreBoard {
    repo: Arc<dyn HighScoreRepository>,
    key: String,
}

impl ScoreBoard {
    #[must_use]
    pub fn new(repo: Arc<dyn HighScoreRepository>, key: impl Into<String>) -> Self {
        Self {
            repo,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current stored best, 0 when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `ScoreBoardError` on storage failures.
    pub async fn high_score(&self) -> Result<HighScore, ScoreBoardError> {
        Ok(self.repo.get_high_score(&self.key).await?)
    }

    /// Compare a finished score with the stored best and persist it if it is higher.
    ///
    /// Storage is written only when `score` strictly exceeds the stored value.
    ///
    /// # Errors
    ///
    /// Returns `ScoreBoardError` on storage failures.
    pub async fn finalize(&self, score: u32, total: u32) -> Result<FinalReport, ScoreBoardError> {
        let stored = self.repo.get_high_score(&self.key).await?;
        let decision = stored.evaluate(score, total);

        if let Some(best) = decision.store {
            self.repo.set_high_score(&self.key, best).await?;
            info!(key = %self.key, previous = stored.value(), best, "new high score");
        }

        Ok(decision.report)
    }
}
