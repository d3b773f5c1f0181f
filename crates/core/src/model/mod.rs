mod difficulty;
mod question;
mod session_set;

pub use difficulty::{Difficulty, ParseDifficultyError};
pub use question::{QuestionDraft, QuestionError, QuestionRecord};
pub use session_set::{SessionSet, SessionSetError};
