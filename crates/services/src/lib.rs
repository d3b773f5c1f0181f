#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod score_board;
pub mod source;

pub use quiz_core::Clock;

pub use config::{QuizConfig, RestartPolicy};
pub use controller::SessionController;
pub use error::{ConfigError, ErrorKind, ScoreBoardError, SessionError, SourceError};
pub use render::{InputEvent, RenderInstruction};
pub use score_board::ScoreBoard;
pub use source::{BundledSource, OpenTriviaSource, QuestionSource, SourceRequest};
