//! Shared error types for the services crate.

use thiserror::Error;

use qudratak_core::model::{ConfigError, PoolError};
use qudratak_core::scoring::ScoreError;

/// A rejected answer selection. Always a caller bug: the UI should never
/// offer an out-of-range position or option.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("position {position} is out of range for {len} questions")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("option {option} is out of range for question {position} with {options} options")]
    OptionOutOfRange {
        position: usize,
        option: usize,
        options: usize,
    },
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("not enough questions for this test: requested {requested}, available {available}")]
    InsufficientQuestions { requested: u32, available: usize },
    #[error(transparent)]
    InvalidSelection(#[from] SelectionError),
    #[error("session already completed")]
    Completed,
    #[error("session is still in progress")]
    NotCompleted,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}

impl SessionError {
    /// True for conditions the caller recovers from by returning the user to
    /// test selection.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::InsufficientQuestions { .. } | SessionError::Config(_))
    }
}

/// Errors emitted while reading configuration blobs and question banks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BlobError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pool(#[from] PoolError),
}
