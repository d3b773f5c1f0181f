#![forbid(unsafe_code)]

pub mod countdown;
pub mod model;
pub mod progress;
pub mod score;
pub mod session;
pub mod time;

pub use countdown::{Countdown, CountdownEvent, URGENCY_THRESHOLD_SECS};
pub use progress::Progress;
pub use score::{DEFAULT_HIGH_SCORE_KEY, FinalReport, HighScore, HighScoreDecision};
pub use session::{AnswerOutcome, Advance, QuestionPhase, QuizSession, Reveal, SessionStatus};
pub use time::Clock;
