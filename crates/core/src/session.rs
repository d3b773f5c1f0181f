use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::countdown::{Countdown, CountdownEvent};
use crate::model::{QuestionRecord, SessionSet};
use crate::progress::Progress;

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// State of the question currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    AwaitingSelection,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// How a single question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { selected: usize },
    Incorrect { selected: usize },
    TimedOut,
}

impl AnswerOutcome {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, AnswerOutcome::Correct { .. })
    }
}

/// What presentation should highlight once a question is resolved.
///
/// `selected` is `None` on timeout, in which case only the correct option is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reveal {
    pub selected: Option<usize>,
    pub correct_index: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Loaded { index: usize },
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one run through a `SessionSet`.
///
/// Owns the countdown of the question on screen, so at most one countdown
/// exists per session. Every transition is a no-op when called from the wrong
/// state, which makes late timer ticks and double submissions harmless.
pub struct QuizSession {
    set: Arc<SessionSet>,
    seconds_per_question: u32,
    current_index: usize,
    score: u32,
    phase: QuestionPhase,
    status: SessionStatus,
    countdown: Countdown,
    outcomes: Vec<AnswerOutcome>,
    loads: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session and load its first question.
    ///
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn start(
        set: Arc<SessionSet>,
        seconds_per_question: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::start_with_countdown(set, seconds_per_question, started_at, Countdown::new())
    }

    /// Like [`QuizSession::start`], reusing the countdown of a previous session
    /// so its generation keeps increasing across sessions.
    #[must_use]
    pub fn start_with_countdown(
        set: Arc<SessionSet>,
        seconds_per_question: u32,
        started_at: DateTime<Utc>,
        mut countdown: Countdown,
    ) -> Self {
        countdown.stop();
        let capacity = set.len();
        let mut session = Self {
            set,
            seconds_per_question,
            current_index: 0,
            score: 0,
            phase: QuestionPhase::AwaitingSelection,
            status: SessionStatus::InProgress,
            countdown,
            outcomes: Vec::with_capacity(capacity),
            loads: 0,
            started_at,
            completed_at: None,
        };
        session.load_question(0);
        session
    }

    fn load_question(&mut self, index: usize) {
        self.current_index = index;
        self.phase = QuestionPhase::AwaitingSelection;
        self.countdown.start(self.seconds_per_question);
        self.loads += 1;
    }

    fn awaiting_selection(&self) -> bool {
        self.status == SessionStatus::InProgress && self.phase == QuestionPhase::AwaitingSelection
    }

    /// Resolve the current question with the chosen option.
    ///
    /// Returns `None` without touching any state when the question is already
    /// resolved, the session is complete, or `option_index` is out of range.
    pub fn select(&mut self, option_index: usize) -> Option<Reveal> {
        if !self.awaiting_selection() {
            return None;
        }
        let question = self.set.get(self.current_index)?;
        if option_index >= question.option_count() {
            return None;
        }

        let correct_index = question.answer_index();
        let is_correct = question.is_correct(option_index);

        self.countdown.stop();
        self.phase = QuestionPhase::Resolved;
        if is_correct {
            self.score += 1;
            self.outcomes.push(AnswerOutcome::Correct {
                selected: option_index,
            });
        } else {
            self.outcomes.push(AnswerOutcome::Incorrect {
                selected: option_index,
            });
        }

        Some(Reveal {
            selected: Some(option_index),
            correct_index,
            is_correct,
        })
    }

    /// Resolve the current question as unanswered.
    ///
    /// Returns `None` if the question was already resolved.
    pub fn timeout(&mut self) -> Option<Reveal> {
        if !self.awaiting_selection() {
            return None;
        }
        let correct_index = self.set.get(self.current_index)?.answer_index();

        self.countdown.stop();
        self.phase = QuestionPhase::Resolved;
        self.outcomes.push(AnswerOutcome::TimedOut);

        Some(Reveal {
            selected: None,
            correct_index,
            is_correct: false,
        })
    }

    /// Forward one elapsed second to the countdown of the current question.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        if !self.awaiting_selection() {
            return None;
        }
        self.countdown.tick()
    }

    /// Move past a resolved question.
    ///
    /// Returns `None` while the current question is still awaiting selection.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Option<Advance> {
        if self.status != SessionStatus::InProgress || self.phase != QuestionPhase::Resolved {
            return None;
        }

        let next = self.current_index + 1;
        if next < self.set.len() {
            self.load_question(next);
            return Some(Advance::Loaded { index: next });
        }

        self.countdown.stop();
        self.current_index = self.set.len();
        self.status = SessionStatus::Completed;
        self.completed_at = Some(now);
        Some(Advance::Completed)
    }

    /// Tear the session down, handing back its stopped countdown.
    #[must_use]
    pub fn into_countdown(mut self) -> Countdown {
        self.countdown.stop();
        self.countdown
    }

    #[must_use]
    pub fn set(&self) -> &Arc<SessionSet> {
        &self.set
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        match self.status {
            SessionStatus::InProgress => self.set.get(self.current_index),
            SessionStatus::Completed => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of questions in the session.
    #[must_use]
    pub fn total(&self) -> usize {
        self.set.len()
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        self.phase
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// True once the current question has been resolved by selection or timeout.
    #[must_use]
    pub fn answer_locked(&self) -> bool {
        self.phase == QuestionPhase::Resolved
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    #[must_use]
    pub fn outcomes(&self) -> &[AnswerOutcome] {
        &self.outcomes
    }

    /// How many times a question has been loaded in this session.
    #[must_use]
    pub fn loads(&self) -> usize {
        self.loads
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress::new(self.current_index, self.set.len())
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.set.len())
            .field("current_index", &self.current_index)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("status", &self.status)
            .field("seconds_remaining", &self.countdown.remaining())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}
