use serde::{Deserialize, Serialize};

/// Key under which the best-ever score is persisted by default.
pub const DEFAULT_HIGH_SCORE_KEY: &str = "quiz_highscore";

/// Final tally shown when a session completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub score: u32,
    pub total: u32,
    pub is_new_high_score: bool,
    pub displayed_high_score: u32,
}

impl FinalReport {
    /// Tally for a session whose stored best could not be read or written.
    ///
    /// Never claims a new high score; the session's own score stands in as the
    /// displayed best.
    #[must_use]
    pub fn without_high_score(score: u32, total: u32) -> Self {
        Self {
            score,
            total,
            is_new_high_score: false,
            displayed_high_score: score,
        }
    }
}

/// Outcome of comparing a finished score against the stored best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighScoreDecision {
    pub report: FinalReport,
    /// Value to persist, present only when the stored best was beaten.
    pub store: Option<u32>,
}

/// Best-ever score as read from persistence (0 when nothing is stored).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HighScore(u32);

impl HighScore {
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Apply the high-score rule to a finished session.
    ///
    /// A strictly greater score replaces the stored best; a tie does not.
    #[must_use]
    pub fn evaluate(self, score: u32, total: u32) -> HighScoreDecision {
        if score > self.0 {
            HighScoreDecision {
                report: FinalReport {
                    score,
                    total,
                    is_new_high_score: true,
                    displayed_high_score: score,
                },
                store: Some(score),
            }
        } else {
            HighScoreDecision {
                report: FinalReport {
                    score,
                    total,
                    is_new_high_score: false,
                    displayed_high_score: self.0,
                },
                store: None,
            }
        }
    }
}

impl From<Option<u32>> for HighScore {
    fn from(stored: Option<u32>) -> Self {
        Self(stored.unwrap_or(0))
    }
}
