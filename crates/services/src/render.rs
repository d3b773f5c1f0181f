//! The contract between the controller and whatever displays the quiz.

use quiz_core::{FinalReport, Progress, Reveal};

use crate::error::{ErrorKind, SessionError};
use crate::source::SourceRequest;

/// A single display update emitted by `SessionController`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    RenderQuestion { text: String, options: Vec<String> },
    ShowTick { seconds_remaining: u32 },
    RevealAnswer(Reveal),
    SetAdvanceEnabled(bool),
    ShowProgress(Progress),
    ShowFinalReport(FinalReport),
    ShowError { kind: ErrorKind, message: String },
}

impl RenderInstruction {
    #[must_use]
    pub fn error(err: &SessionError) -> Self {
        Self::ShowError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// User intents forwarded by the presentation layer, plus timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Select(usize),
    AdvanceRequested,
    StartRequested(SourceRequest),
    RestartRequested,
    /// One second of wall time elapsed.
    Tick,
}
