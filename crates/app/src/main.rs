use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::Difficulty;
use services::{
    BundledSource, InputEvent, OpenTriviaSource, QuestionSource, QuizConfig, SessionController,
    SourceRequest,
};
use storage::repository::{HighScoreRepository, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod presenter;

use presenter::TerminalPresenter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSource { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDifficulty { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSource { raw } => {
                write!(f, "invalid --source value: {raw} (expected bundled or trivia)")
            }
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected a positive integer)")
            }
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn positive<T>(flag: &'static str, raw: String) -> Result<T, ArgsError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    services::config::parse_positive(flag, &raw)
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceKind {
    Bundled,
    Trivia,
}

impl SourceKind {
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bundled" => Ok(Self::Bundled),
            "trivia" => Ok(Self::Trivia),
            _ => Err(ArgsError::InvalidSource {
                raw: raw.to_owned(),
            }),
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play       [options]");
    eprintln!("  cargo run -p app -- high-score [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options for play:");
    eprintln!("  --db <sqlite_url>           default sqlite:quiz.sqlite3");
    eprintln!("  --source bundled|trivia     default bundled");
    eprintln!("  --count <n>                 questions per quiz (default 5)");
    eprintln!("  --difficulty <level>        any|easy|medium|hard (trivia only)");
    eprintln!("  --seconds <n>               seconds per question (default 15)");
    eprintln!("  --shuffle                   shuffle question order (bundled only)");
    eprintln!();
    eprintln!("Keys: 1-9 answer, n next, r restart, s new quiz, q quit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SOURCE, QUIZ_SECONDS_PER_QUESTION, QUIZ_QUESTION_COUNT,");
    eprintln!("  QUIZ_DIFFICULTY, QUIZ_HIGHSCORE_KEY, QUIZ_RESTART_POLICY, QUIZ_SHUFFLE,");
    eprintln!("  QUIZ_TRIVIA_BASE_URL, QUIZ_TRIVIA_CATEGORY, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    HighScore,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "high-score" => Some(Self::HighScore),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    source: SourceKind,
    config: QuizConfig,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        mut config: QuizConfig,
    ) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3".into()),
        );
        let mut source = match std::env::var("QUIZ_SOURCE") {
            Ok(raw) => SourceKind::parse(&raw)?,
            Err(_) => SourceKind::Bundled,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--source" => {
                    source = SourceKind::parse(&require_value(args, "--source")?)?;
                }
                "--count" => {
                    config.question_count = positive("--count", require_value(args, "--count")?)?;
                }
                "--seconds" => {
                    config.seconds_per_question =
                        positive("--seconds", require_value(args, "--seconds")?)?;
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    config.difficulty = value
                        .parse::<Difficulty>()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--shuffle" => config.shuffle_questions = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            source,
            config,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Event(InputEvent),
    Quit,
}

fn parse_key(line: &str, request: SourceRequest) -> Option<Key> {
    match line.trim() {
        "q" => Some(Key::Quit),
        "n" => Some(Key::Event(InputEvent::AdvanceRequested)),
        "r" => Some(Key::Event(InputEvent::RestartRequested)),
        "s" => Some(Key::Event(InputEvent::StartRequested(request))),
        digit => match digit.parse::<usize>() {
            Ok(n @ 1..=9) => Some(Key::Event(InputEvent::Select(n - 1))),
            _ => None,
        },
    }
}

async fn play(
    mut controller: SessionController,
    request: SourceRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut presenter = TerminalPresenter::new(io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    presenter.hint()?;
    let out = controller
        .handle(InputEvent::StartRequested(request))
        .await;
    presenter.render(&out)?;

    // The ticker is realigned whenever a new countdown starts so each
    // question gets full seconds.
    let mut generation = controller.live_countdown();
    ticker.reset();

    loop {
        let event = tokio::select! {
            _ = ticker.tick(), if generation.is_some() => InputEvent::Tick,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_key(&line, request) {
                    Some(Key::Quit) => break,
                    Some(Key::Event(InputEvent::AdvanceRequested))
                        if !presenter.advance_enabled() =>
                    {
                        debug!("advance key before the answer was revealed");
                        continue;
                    }
                    Some(Key::Event(event)) => event,
                    None => {
                        presenter.hint()?;
                        continue;
                    }
                }
            }
        };

        let out = controller.handle(event).await;
        presenter.render(&out)?;

        let live = controller.live_countdown();
        if live != generation {
            if live.is_some() {
                ticker.reset();
            }
            generation = live;
        }
    }

    info!(report = ?controller.last_report(), "leaving quiz");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let config = QuizConfig::from_env()?;
    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter, config).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let config = parsed.config.validate()?;

    init_tracing();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Play => {
            let source: Arc<dyn QuestionSource> = match parsed.source {
                SourceKind::Bundled => Arc::new(
                    BundledSource::web_basics().with_shuffle(config.shuffle_questions),
                ),
                SourceKind::Trivia => Arc::new(OpenTriviaSource::from_env()?),
            };
            let request = config.source_request()?;
            info!(
                source = ?parsed.source,
                db = %parsed.db_url,
                count = request.count(),
                seconds = config.seconds_per_question,
                "starting quiz"
            );
            let controller = SessionController::new(&config, source, storage.high_scores);
            play(controller, request).await
        }
        Command::HighScore => {
            let high = storage.high_scores.get_high_score(&config.high_score_key).await?;
            println!("{}: {}", config.high_score_key, high.value());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
