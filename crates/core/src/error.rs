use thiserror::Error;

use crate::model::{ConfigError, ExamDefaultsError, PoolError, QuestionError};
use crate::scoring::ScoreError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Defaults(#[from] ExamDefaultsError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}
