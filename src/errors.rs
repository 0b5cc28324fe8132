/*!
 * Error types for the chaperone moderation engine.
 *
 * The library surfaces exactly one `ModerationError` per fatal condition;
 * recoverable problems (bad keyword rows, malformed cue blocks) are skipped
 * and counted instead of being raised. The binary wraps everything in
 * `AppError`.
 */

use thiserror::Error;

/// Fatal errors produced by the moderation core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModerationError {
    /// Keyword input is absent or unreadable as a whole
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transcript has no structure recognizable as a cue-based subtitle file
    #[error("Transcript parse error: {0}")]
    Parse(String),

    /// Required input missing or empty at the API boundary
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ModerationError {
    /// Short machine-readable kind, used in job status messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::Parse(_) => "ParseError",
            Self::Validation(_) => "ValidationError",
        }
    }

    /// Whether an identical retry could succeed.
    ///
    /// The core is deterministic, so resubmitting the same inputs after any
    /// of these errors yields the same error again.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the moderation core
    #[error("Moderation error: {0}")]
    Moderation(#[from] ModerationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<ModerationError>() {
            Ok(moderation) => Self::Moderation(moderation),
            Err(other) => Self::Unknown(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
