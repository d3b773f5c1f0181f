use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::model::{Difficulty, QuestionDraft, QuestionRecord, SessionSet};
use quiz_core::time::fixed_clock;
use quiz_core::{FinalReport, QuestionPhase, Reveal};
use services::{
    BundledSource, ErrorKind, InputEvent, QuestionSource, QuizConfig, RenderInstruction,
    RestartPolicy, SessionController, SessionError, SourceError, SourceRequest,
};
use quiz_core::HighScore;
use storage::repository::{HighScoreRepository, InMemoryRepository, StorageError};

const KEY: &str = "quiz_highscore";

fn questions(answers: &[usize]) -> Vec<QuestionRecord> {
    answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            QuestionDraft::new(format!("Question {i}"), ["w", "x", "y", "z"], *answer)
                .validate()
                .unwrap()
        })
        .collect()
}

fn config(seconds: u32) -> QuizConfig {
    QuizConfig {
        seconds_per_question: seconds,
        ..QuizConfig::default()
    }
}

fn controller_with(
    config: &QuizConfig,
    source: Arc<dyn QuestionSource>,
    repo: &InMemoryRepository,
) -> SessionController {
    SessionController::new(config, source, Arc::new(repo.clone())).with_clock(fixed_clock())
}

fn controller(seconds: u32, repo: &InMemoryRepository) -> SessionController {
    controller_with(
        &config(seconds),
        Arc::new(BundledSource::web_basics()),
        repo,
    )
}

fn ticks_shown(instructions: &[RenderInstruction]) -> usize {
    instructions
        .iter()
        .filter(|i| matches!(i, RenderInstruction::ShowTick { .. }))
        .count()
}

fn final_report(instructions: &[RenderInstruction]) -> Option<FinalReport> {
    instructions.iter().find_map(|i| match i {
        RenderInstruction::ShowFinalReport(report) => Some(*report),
        _ => None,
    })
}

/// Source that always fails with a fixed error and counts fetches.
struct ScriptedSource {
    calls: AtomicUsize,
    fail_with: fn(SourceRequest) -> SourceError,
}

#[async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch(&self, request: SourceRequest) -> Result<SessionSet, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.fail_with)(request))
    }
}

/// Source that serves the same set and counts fetches.
struct CountingSource {
    calls: AtomicUsize,
    answers: Vec<usize>,
}

#[async_trait]
impl QuestionSource for CountingSource {
    async fn fetch(&self, _request: SourceRequest) -> Result<SessionSet, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SessionSet::new(questions(&self.answers))?)
    }
}

/// Source that serves one set, then fails every later fetch.
struct OneShotSource {
    calls: AtomicUsize,
    answers: Vec<usize>,
}

#[async_trait]
impl QuestionSource for OneShotSource {
    async fn fetch(&self, _request: SourceRequest) -> Result<SessionSet, SourceError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(SessionSet::new(questions(&self.answers))?)
        } else {
            Err(SourceError::Unavailable("service down".into()))
        }
    }
}

/// High-score backend whose every read and write fails.
struct UnreachableScores;

#[async_trait]
impl HighScoreRepository for UnreachableScores {
    async fn get_high_score(&self, _key: &str) -> Result<HighScore, StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }

    async fn set_high_score(&self, _key: &str, _score: u32) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}

#[tokio::test]
async fn scripted_run_scores_one_of_three() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(3, &repo);

    let shown = quiz.start_session(questions(&[1, 0, 2])).unwrap();
    assert_eq!(
        shown[1],
        RenderInstruction::RenderQuestion {
            text: "Question 0".into(),
            options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
        }
    );
    assert!(shown.contains(&RenderInstruction::ShowTick {
        seconds_remaining: 3
    }));
    assert!(shown.contains(&RenderInstruction::SetAdvanceEnabled(false)));

    // Q1: correct.
    let shown = quiz.on_select(1);
    assert_eq!(
        shown,
        vec![
            RenderInstruction::RevealAnswer(Reveal {
                selected: Some(1),
                correct_index: 1,
                is_correct: true
            }),
            RenderInstruction::SetAdvanceEnabled(true),
        ]
    );
    quiz.on_advance().await;

    // Q2: wrong, correct option is revealed too.
    let shown = quiz.on_select(1);
    assert_eq!(
        shown[0],
        RenderInstruction::RevealAnswer(Reveal {
            selected: Some(1),
            correct_index: 0,
            is_correct: false
        })
    );
    quiz.on_advance().await;

    // Q3: let the countdown run out.
    assert_eq!(
        quiz.on_tick(),
        vec![RenderInstruction::ShowTick {
            seconds_remaining: 2
        }]
    );
    quiz.on_tick();
    let shown = quiz.on_tick();
    assert_eq!(
        shown,
        vec![
            RenderInstruction::ShowTick {
                seconds_remaining: 0
            },
            RenderInstruction::RevealAnswer(Reveal {
                selected: None,
                correct_index: 2,
                is_correct: false
            }),
            RenderInstruction::SetAdvanceEnabled(true),
        ]
    );

    let shown = quiz.on_advance().await;
    let report = final_report(&shown).expect("final report");
    assert_eq!(report.score, 1);
    assert_eq!(report.total, 3);
    assert!(report.is_new_high_score);
    assert_eq!(quiz.last_report(), Some(report));
    assert_eq!(repo.stored(KEY), Some(1));
    assert!(quiz.session().unwrap().is_complete());
    assert_eq!(quiz.live_countdown(), None);
}

#[tokio::test]
async fn empty_set_is_a_configuration_error() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);

    let err = quiz.start_session(Vec::new()).unwrap_err();

    assert!(matches!(err, SessionError::Configuration(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(quiz.session().is_none());
}

#[tokio::test]
async fn every_question_loads_once_before_completion() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);
    let answers = [0, 1, 2, 3, 0, 1];
    quiz.start_session(questions(&answers)).unwrap();

    let mut previous = quiz.session().unwrap().current_index();
    for _ in 1..answers.len() {
        quiz.on_select(3);
        let shown = quiz.on_advance().await;
        assert!(final_report(&shown).is_none());
        let index = quiz.session().unwrap().current_index();
        assert_eq!(index, previous + 1);
        previous = index;
    }
    quiz.on_select(3);
    let shown = quiz.on_advance().await;

    assert!(final_report(&shown).is_some());
    let session = quiz.session().unwrap();
    assert_eq!(session.loads(), answers.len());
    assert_eq!(session.score(), 1);
}

#[tokio::test]
async fn double_select_only_counts_first() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);
    quiz.start_session(questions(&[2, 0])).unwrap();

    assert!(!quiz.on_select(2).is_empty());
    assert!(quiz.on_select(2).is_empty());
    assert!(quiz.on_select(0).is_empty());

    let session = quiz.session().unwrap();
    assert_eq!(session.score(), 1);
    assert_eq!(session.outcomes().len(), 1);
}

#[tokio::test]
async fn late_timeout_after_selection_is_ignored() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(1, &repo);
    quiz.start_session(questions(&[0])).unwrap();

    quiz.on_select(0);
    assert!(quiz.on_timeout_fired().is_empty());
    assert!(quiz.on_tick().is_empty());
    assert_eq!(quiz.session().unwrap().score(), 1);
}

#[tokio::test]
async fn advance_before_resolution_is_ignored() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);
    quiz.start_session(questions(&[0, 1])).unwrap();

    assert!(quiz.on_advance().await.is_empty());
    assert_eq!(quiz.session().unwrap().current_index(), 0);
    assert_eq!(
        quiz.session().unwrap().phase(),
        QuestionPhase::AwaitingSelection
    );
}

#[tokio::test]
async fn restart_mid_session_resets_and_replaces_countdown() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(10, &repo);
    quiz.start_session(questions(&[0, 1, 2])).unwrap();

    quiz.on_select(0);
    quiz.on_advance().await;
    quiz.on_tick();
    quiz.on_select(1);
    assert_eq!(quiz.session().unwrap().current_index(), 1);
    assert!(quiz.session().unwrap().answer_locked());
    let before = quiz.session().unwrap().countdown().generation();
    assert_eq!(quiz.live_countdown(), None);

    let shown = quiz.restart().await.unwrap();

    let session = quiz.session().unwrap();
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.score(), 0);
    assert_eq!(session.loads(), 1);
    assert!(!session.answer_locked());
    assert_eq!(session.seconds_remaining(), 10);
    assert!(quiz.live_countdown().is_some());
    assert_ne!(quiz.live_countdown(), Some(before));
    assert!(shown.contains(&RenderInstruction::ShowTick {
        seconds_remaining: 10
    }));
}

#[tokio::test]
async fn at_most_one_countdown_ticks_at_a_time() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(4, &repo);
    quiz.start_session(questions(&[0, 0, 0])).unwrap();

    let mut generations = Vec::new();
    for step in 0..3 {
        generations.push(quiz.live_countdown().expect("countdown running"));
        assert_eq!(ticks_shown(&quiz.on_tick()), 1);
        if step == 1 {
            quiz.restart().await.unwrap();
            generations.push(quiz.live_countdown().expect("countdown running"));
            assert_eq!(ticks_shown(&quiz.on_tick()), 1);
        }
        quiz.on_select(0);
        assert_eq!(quiz.live_countdown(), None);
        assert!(quiz.on_tick().is_empty());
        quiz.on_advance().await;
    }

    let mut unique = generations.clone();
    unique.dedup();
    assert_eq!(unique, generations);
}

#[tokio::test]
async fn high_score_persists_across_sessions() {
    let repo = InMemoryRepository::with_high_score(KEY, 1);
    let mut quiz = controller(15, &repo);

    quiz.start_session(questions(&[0, 0])).unwrap();
    quiz.on_select(0);
    quiz.on_advance().await;
    quiz.on_select(0);
    let report = final_report(&quiz.on_advance().await).unwrap();
    assert!(report.is_new_high_score);
    assert_eq!(report.displayed_high_score, 2);

    quiz.restart().await.unwrap();
    quiz.on_select(1);
    quiz.on_advance().await;
    quiz.on_timeout_fired();
    let report = final_report(&quiz.on_advance().await).unwrap();
    assert_eq!(report.score, 0);
    assert!(!report.is_new_high_score);
    assert_eq!(report.displayed_high_score, 2);
    assert_eq!(repo.stored(KEY), Some(2));
}

#[tokio::test]
async fn start_requested_uses_source() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);
    let request = SourceRequest::new(3, Difficulty::Any).unwrap();

    let shown = quiz.handle(InputEvent::StartRequested(request)).await;

    assert!(shown.contains(&RenderInstruction::RenderQuestion {
        text: "What is the full form of HTML?".into(),
        options: vec![
            "Hello to my land".into(),
            "Hey text markup language".into(),
            "Hypertext markup language".into(),
            "Hypertext makeup language".into(),
        ],
    }));
    assert_eq!(quiz.session().unwrap().total(), 3);
}

#[tokio::test]
async fn insufficient_questions_leave_running_session_alone() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);
    quiz.start_session(questions(&[1])).unwrap();

    let request = SourceRequest::new(50, Difficulty::Hard).unwrap();
    let shown = quiz.handle(InputEvent::StartRequested(request)).await;

    assert!(matches!(
        shown.as_slice(),
        [RenderInstruction::ShowError {
            kind: ErrorKind::InsufficientQuestions,
            ..
        }]
    ));
    let session = quiz.session().unwrap();
    assert_eq!(session.total(), 1);
    assert_eq!(session.phase(), QuestionPhase::AwaitingSelection);
}

#[tokio::test]
async fn unavailable_source_is_reported_distinctly() {
    let repo = InMemoryRepository::new();
    let source = Arc::new(ScriptedSource {
        calls: AtomicUsize::new(0),
        fail_with: |_| SourceError::Unavailable("connection refused".into()),
    });
    let mut quiz = controller_with(&config(15), source.clone(), &repo);

    let request = SourceRequest::new(5, Difficulty::Any).unwrap();
    let shown = quiz.handle(InputEvent::StartRequested(request)).await;

    assert!(matches!(
        shown.as_slice(),
        [RenderInstruction::ShowError {
            kind: ErrorKind::SourceUnavailable,
            ..
        }]
    ));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(quiz.session().is_none());
}

#[tokio::test]
async fn restart_without_session_is_an_error() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);

    let shown = quiz.handle(InputEvent::RestartRequested).await;

    assert!(matches!(
        shown.as_slice(),
        [RenderInstruction::ShowError {
            kind: ErrorKind::Configuration,
            ..
        }]
    ));
}

#[tokio::test]
async fn refetch_policy_asks_source_again_on_restart() {
    let repo = InMemoryRepository::new();
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
        answers: vec![0, 1],
    });
    let config = QuizConfig {
        restart_policy: RestartPolicy::Refetch,
        ..config(15)
    };
    let mut quiz = controller_with(&config, source.clone(), &repo);

    let request = SourceRequest::new(2, Difficulty::Medium).unwrap();
    quiz.start_requested(request).await.unwrap();
    quiz.on_select(0);
    quiz.restart().await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(quiz.session().unwrap().score(), 0);
}

#[tokio::test]
async fn failed_refetch_keeps_running_session() {
    let repo = InMemoryRepository::new();
    let source = Arc::new(OneShotSource {
        calls: AtomicUsize::new(0),
        answers: vec![0, 1],
    });
    let config = QuizConfig {
        restart_policy: RestartPolicy::Refetch,
        ..config(15)
    };
    let mut quiz = controller_with(&config, source.clone(), &repo);

    let request = SourceRequest::new(2, Difficulty::Any).unwrap();
    quiz.start_requested(request).await.unwrap();
    quiz.on_select(0);
    let generation = quiz.session().unwrap().countdown().generation();

    let shown = quiz.handle(InputEvent::RestartRequested).await;

    assert!(matches!(
        shown.as_slice(),
        [RenderInstruction::ShowError {
            kind: ErrorKind::SourceUnavailable,
            ..
        }]
    ));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    let session = quiz.session().expect("session survives a failed refetch");
    assert_eq!(session.score(), 1);
    assert!(session.answer_locked());
    assert_eq!(session.countdown().generation(), generation);

    let shown = quiz.on_advance().await;
    assert!(shown.contains(&RenderInstruction::SetAdvanceEnabled(false)));
    assert_eq!(quiz.session().unwrap().current_index(), 1);
}

#[tokio::test]
async fn storage_failure_still_shows_final_tally() {
    let mut quiz = SessionController::new(
        &config(15),
        Arc::new(BundledSource::web_basics()),
        Arc::new(UnreachableScores),
    )
    .with_clock(fixed_clock());
    quiz.start_session(questions(&[2])).unwrap();
    quiz.on_select(2);

    let shown = quiz.handle(InputEvent::AdvanceRequested).await;

    assert_eq!(shown.len(), 3);
    assert_eq!(shown[0], RenderInstruction::SetAdvanceEnabled(false));
    assert_eq!(
        shown[1],
        RenderInstruction::ShowFinalReport(FinalReport {
            score: 1,
            total: 1,
            is_new_high_score: false,
            displayed_high_score: 1,
        })
    );
    assert!(matches!(
        shown[2],
        RenderInstruction::ShowError {
            kind: ErrorKind::Storage,
            ..
        }
    ));
    assert!(quiz.session().unwrap().is_complete());
    assert_eq!(quiz.last_report().map(|r| r.score), Some(1));
}

#[tokio::test]
async fn reuse_policy_replays_same_set() {
    let repo = InMemoryRepository::new();
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
        answers: vec![3],
    });
    let mut quiz = controller_with(&config(15), source.clone(), &repo);

    let request = SourceRequest::new(1, Difficulty::Any).unwrap();
    quiz.start_requested(request).await.unwrap();
    let first = Arc::clone(quiz.session().unwrap().set());
    quiz.restart().await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, quiz.session().unwrap().set()));
}

#[tokio::test]
async fn progress_is_shown_for_each_question() {
    let repo = InMemoryRepository::new();
    let mut quiz = controller(15, &repo);

    let shown = quiz.start_session(questions(&[0, 0])).unwrap();
    let RenderInstruction::ShowProgress(progress) = shown[0] else {
        panic!("expected progress first, got {shown:?}");
    };
    assert_eq!((progress.current_one_based, progress.total, progress.percent), (1, 2, 0));

    quiz.on_select(0);
    let shown = quiz.on_advance().await;
    let RenderInstruction::ShowProgress(progress) = shown[0] else {
        panic!("expected progress first, got {shown:?}");
    };
    assert_eq!((progress.current_one_based, progress.total, progress.percent), (2, 2, 50));
}
