use std::env;
use std::str::FromStr;

use quiz_core::DEFAULT_HIGH_SCORE_KEY;
use quiz_core::model::Difficulty;

use crate::error::ConfigError;
use crate::source::SourceRequest;

pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 15;
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// What `restart` does with the question set of the finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Replay the same set from the first question.
    #[default]
    Reuse,
    /// Ask the question source for a fresh set with the last request.
    Refetch,
}

impl FromStr for RestartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reuse" => Ok(Self::Reuse),
            "refetch" => Ok(Self::Refetch),
            _ => Err(ConfigError::RestartPolicy(s.to_owned())),
        }
    }
}

/// Session settings shared by the controller and the app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub seconds_per_question: u32,
    pub question_count: usize,
    pub difficulty: Difficulty,
    pub high_score_key: String,
    pub restart_policy: RestartPolicy,
    /// Shuffle question order in sources that support it.
    pub shuffle_questions: bool,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            question_count: DEFAULT_QUESTION_COUNT,
            difficulty: Difficulty::Any,
            high_score_key: DEFAULT_HIGH_SCORE_KEY.to_owned(),
            restart_policy: RestartPolicy::Reuse,
            shuffle_questions: false,
        }
    }
}

impl QuizConfig {
    /// Defaults overridden by `QUIZ_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`QuizConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("QUIZ_SECONDS_PER_QUESTION") {
            config.seconds_per_question = parse_positive("QUIZ_SECONDS_PER_QUESTION", &raw)?;
        }
        if let Some(raw) = lookup("QUIZ_QUESTION_COUNT") {
            config.question_count = parse_positive("QUIZ_QUESTION_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("QUIZ_DIFFICULTY") {
            config.difficulty = raw.parse()?;
        }
        if let Some(raw) = lookup("QUIZ_HIGHSCORE_KEY") {
            config.high_score_key = raw.trim().to_owned();
        }
        if let Some(raw) = lookup("QUIZ_RESTART_POLICY") {
            config.restart_policy = raw.parse()?;
        }
        if let Some(raw) = lookup("QUIZ_SHUFFLE") {
            config.shuffle_questions = parse_flag("QUIZ_SHUFFLE", &raw)?;
        }

        config.validate()
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for a zero duration, a zero count or an empty key.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.seconds_per_question == 0 {
            return Err(ConfigError::ZeroSeconds);
        }
        if self.question_count == 0 {
            return Err(ConfigError::ZeroCount);
        }
        if self.high_score_key.is_empty() {
            return Err(ConfigError::EmptyHighScoreKey);
        }
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCount` if the configured count is zero.
    pub fn source_request(&self) -> Result<SourceRequest, ConfigError> {
        SourceRequest::new(self.question_count, self.difficulty)
    }
}

/// Parse a strictly positive integer from a config value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidNumber` if the value is not a positive integer.
pub fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            var,
            raw: raw.to_owned(),
        }),
    }
}

/// Parse an on/off config value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidFlag` for anything but `1/0`, `true/false`,
/// `yes/no` or `on/off`.
pub fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            raw: raw.to_owned(),
        }),
    }
}
