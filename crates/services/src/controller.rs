use std::fmt;
use std::sync::Arc;

use quiz_core::model::{QuestionRecord, SessionSet};
use quiz_core::{Advance, Clock, Countdown, CountdownEvent, FinalReport, QuizSession};
use storage::repository::HighScoreRepository;
use tracing::{debug, info, warn};

use crate::config::{QuizConfig, RestartPolicy};
use crate::error::SessionError;
use crate::render::{InputEvent, RenderInstruction};
use crate::score_board::ScoreBoard;
use crate::source::{QuestionSource, SourceRequest};

/// Drives one quiz at a time in response to presentation events.
///
/// Every handler takes `&mut self` and runs to completion, so events are
/// processed strictly one after another. The controller owns the only
/// `QuizSession`, and with it the only live countdown.
pub struct SessionController {
    clock: Clock,
    source: Arc<dyn QuestionSource>,
    score_board: ScoreBoard,
    seconds_per_question: u32,
    restart_policy: RestartPolicy,
    session: Option<QuizSession>,
    /// Countdown for the first session; later sessions inherit their predecessor's.
    idle_countdown: Countdown,
    last_request: Option<SourceRequest>,
    last_report: Option<FinalReport>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        config: &QuizConfig,
        source: Arc<dyn QuestionSource>,
        high_scores: Arc<dyn HighScoreRepository>,
    ) -> Self {
        Self {
            clock: Clock::default(),
            source,
            score_board: ScoreBoard::new(high_scores, config.high_score_key.clone()),
            seconds_per_question: config.seconds_per_question,
            restart_policy: config.restart_policy,
            session: None,
            idle_countdown: Countdown::new(),
            last_request: None,
            last_report: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    //
    // ─── SESSION LIFECYCLE ─────────────────────────────────────────────────────
    //

    /// Start a session over the given questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if `questions` is empty; no session
    /// is created and any running session is left untouched.
    pub fn start_session(
        &mut self,
        questions: Vec<QuestionRecord>,
    ) -> Result<Vec<RenderInstruction>, SessionError> {
        let set = SessionSet::new(questions)?;
        Ok(self.begin(Arc::new(set)))
    }

    /// Fetch a fresh set from the question source and start on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Source` if the source cannot supply the questions.
    /// A failed fetch does not disturb a running session.
    pub async fn start_requested(
        &mut self,
        request: SourceRequest,
    ) -> Result<Vec<RenderInstruction>, SessionError> {
        let set = self.fetch(request).await?;
        self.last_request = Some(request);
        Ok(self.begin(set))
    }

    /// Start again from the first question.
    ///
    /// With `RestartPolicy::Refetch` and a previous source request, a new set is
    /// fetched; otherwise the previous set is replayed. The running session is
    /// only torn down once the replacement set is in hand.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSession` if nothing was started before, or a
    /// source error if refetching fails. Either way the running session, if
    /// any, keeps going.
    pub async fn restart(&mut self) -> Result<Vec<RenderInstruction>, SessionError> {
        let previous = self
            .session
            .as_ref()
            .map(|session| Arc::clone(session.set()))
            .ok_or(SessionError::NoSession)?;

        let set = match (self.restart_policy, self.last_request) {
            (RestartPolicy::Refetch, Some(request)) => self.fetch(request).await?,
            _ => previous,
        };
        Ok(self.begin(set))
    }

    async fn fetch(&self, request: SourceRequest) -> Result<Arc<SessionSet>, SessionError> {
        let set = self.source.fetch(request).await.inspect_err(|err| {
            warn!(error = %err, count = request.count(), "question source failed");
        })?;
        Ok(Arc::new(set))
    }

    fn begin(&mut self, set: Arc<SessionSet>) -> Vec<RenderInstruction> {
        let countdown = match self.session.take() {
            Some(previous) => previous.into_countdown(),
            None => std::mem::take(&mut self.idle_countdown),
        };
        info!(questions = set.len(), seconds = self.seconds_per_question, "starting quiz session");
        self.session = Some(QuizSession::start_with_countdown(
            set,
            self.seconds_per_question,
            self.clock.now(),
            countdown,
        ));
        self.last_report = None;
        self.question_instructions()
    }

    fn question_instructions(&self) -> Vec<RenderInstruction> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        let Some(question) = session.current_question() else {
            return Vec::new();
        };
        vec![
            RenderInstruction::ShowProgress(session.progress()),
            RenderInstruction::RenderQuestion {
                text: question.question().to_owned(),
                options: question.options().to_vec(),
            },
            RenderInstruction::ShowTick {
                seconds_remaining: session.seconds_remaining(),
            },
            RenderInstruction::SetAdvanceEnabled(false),
        ]
    }

    //
    // ─── QUESTION EVENTS ───────────────────────────────────────────────────────
    //

    /// The user picked option `option_index` of the current question.
    ///
    /// Ignored when the question is already resolved or the index is out of range.
    pub fn on_select(&mut self, option_index: usize) -> Vec<RenderInstruction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        match session.select(option_index) {
            Some(reveal) => {
                debug!(
                    index = session.current_index(),
                    option_index,
                    correct = reveal.is_correct,
                    score = session.score(),
                    "question answered"
                );
                vec![
                    RenderInstruction::RevealAnswer(reveal),
                    RenderInstruction::SetAdvanceEnabled(true),
                ]
            }
            None => {
                debug!(option_index, "selection ignored");
                Vec::new()
            }
        }
    }

    /// One second elapsed. Forwards expiry to [`Self::on_timeout_fired`].
    pub fn on_tick(&mut self) -> Vec<RenderInstruction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        match session.tick() {
            Some(CountdownEvent::Tick { remaining }) => vec![RenderInstruction::ShowTick {
                seconds_remaining: remaining,
            }],
            Some(CountdownEvent::Expired) => {
                let mut out = vec![RenderInstruction::ShowTick {
                    seconds_remaining: 0,
                }];
                out.extend(self.on_timeout_fired());
                out
            }
            None => Vec::new(),
        }
    }

    /// The countdown of the current question expired.
    pub fn on_timeout_fired(&mut self) -> Vec<RenderInstruction> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        match session.timeout() {
            Some(reveal) => {
                debug!(index = session.current_index(), "question timed out");
                vec![
                    RenderInstruction::RevealAnswer(reveal),
                    RenderInstruction::SetAdvanceEnabled(true),
                ]
            }
            None => Vec::new(),
        }
    }

    /// Move to the next question, or finish the session and report the tally.
    ///
    /// The final report is always shown. If the stored high score cannot be
    /// read or written, the tally is reported without a high-score comparison
    /// and a storage error follows it.
    pub async fn on_advance(&mut self) -> Vec<RenderInstruction> {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        match session.advance(now) {
            None => {
                debug!("advance ignored");
                Vec::new()
            }
            Some(Advance::Loaded { index }) => {
                debug!(index, "question loaded");
                self.question_instructions()
            }
            Some(Advance::Completed) => {
                let score = session.score();
                let total = u32::try_from(session.total()).unwrap_or(u32::MAX);
                let (report, failure) = match self.score_board.finalize(score, total).await {
                    Ok(report) => (report, None),
                    Err(err) => {
                        warn!(error = %err, score, total, "high score unavailable");
                        (
                            FinalReport::without_high_score(score, total),
                            Some(SessionError::from(err)),
                        )
                    }
                };
                info!(
                    score,
                    total,
                    new_high_score = report.is_new_high_score,
                    "quiz session completed"
                );
                self.last_report = Some(report);

                let mut out = vec![
                    RenderInstruction::SetAdvanceEnabled(false),
                    RenderInstruction::ShowFinalReport(report),
                ];
                out.extend(failure.as_ref().map(RenderInstruction::error));
                out
            }
        }
    }

    /// Dispatch a presentation event, turning failures into `ShowError`.
    pub async fn handle(&mut self, event: InputEvent) -> Vec<RenderInstruction> {
        let result = match event {
            InputEvent::Select(option_index) => Ok(self.on_select(option_index)),
            InputEvent::Tick => Ok(self.on_tick()),
            InputEvent::AdvanceRequested => Ok(self.on_advance().await),
            InputEvent::StartRequested(request) => self.start_requested(request).await,
            InputEvent::RestartRequested => self.restart().await,
        };
        result.unwrap_or_else(|err| vec![RenderInstruction::error(&err)])
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn last_report(&self) -> Option<FinalReport> {
        self.last_report
    }

    /// Generation of the live countdown, or `None` when no countdown is running.
    ///
    /// Real-time drivers compare this across events to realign their timer.
    #[must_use]
    pub fn live_countdown(&self) -> Option<u64> {
        self.session
            .as_ref()
            .map(QuizSession::countdown)
            .filter(|countdown| countdown.is_running())
            .map(Countdown::generation)
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("seconds_per_question", &self.seconds_per_question)
            .field("restart_policy", &self.restart_policy)
            .field("session", &self.session)
            .field("last_request", &self.last_request)
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}
