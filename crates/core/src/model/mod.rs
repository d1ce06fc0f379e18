mod config;
mod defaults;
mod ids;
mod pool;
mod question;

pub use config::{
    ConfigError, FixedCounts, QIYAS_DURATION_MINUTES, QiyasLayout, STANDARD_DURATION_MINUTES,
    STANDARD_QUESTION_COUNT, Section, TestConfiguration, TestMode,
};
pub use defaults::{ExamDefaults, ExamDefaultsError};
pub use ids::{AttemptId, ParseIdError, QuestionId, SectionId};
pub use pool::{BankEntry, InMemoryQuestionPool, PoolError, PoolStats, QuestionBank, QuestionPool};
pub use question::{Category, ParseCategoryError, Question, QuestionError};
