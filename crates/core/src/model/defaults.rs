use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::config::{
    ConfigError, STANDARD_DURATION_MINUTES, STANDARD_QUESTION_COUNT, TestConfiguration,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamDefaultsError {
    #[error("default duration must be > 0 minutes")]
    ZeroDuration,

    #[error("defaults must request at least one question")]
    NoQuestions,
}

/// Administrator-chosen defaults used to prefill a custom test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawExamDefaults")]
pub struct ExamDefaults {
    default_verbal_questions: u32,
    default_quantitative_questions: u32,
    default_test_duration: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExamDefaults {
    default_verbal_questions: u32,
    default_quantitative_questions: u32,
    default_test_duration: u32,
}

impl TryFrom<RawExamDefaults> for ExamDefaults {
    type Error = ExamDefaultsError;

    fn try_from(raw: RawExamDefaults) -> Result<Self, Self::Error> {
        ExamDefaults::new(
            raw.default_verbal_questions,
            raw.default_quantitative_questions,
            raw.default_test_duration,
        )
    }
}

impl Default for ExamDefaults {
    fn default() -> Self {
        Self {
            default_verbal_questions: STANDARD_QUESTION_COUNT,
            default_quantitative_questions: STANDARD_QUESTION_COUNT,
            default_test_duration: STANDARD_DURATION_MINUTES,
        }
    }
}

impl ExamDefaults {
    /// # Errors
    ///
    /// Returns `ExamDefaultsError::ZeroDuration` for a zero duration and
    /// `ExamDefaultsError::NoQuestions` when both counts are zero.
    pub fn new(
        verbal_questions: u32,
        quantitative_questions: u32,
        duration_minutes: u32,
    ) -> Result<Self, ExamDefaultsError> {
        if duration_minutes == 0 {
            return Err(ExamDefaultsError::ZeroDuration);
        }
        if verbal_questions == 0 && quantitative_questions == 0 {
            return Err(ExamDefaultsError::NoQuestions);
        }
        Ok(Self {
            default_verbal_questions: verbal_questions,
            default_quantitative_questions: quantitative_questions,
            default_test_duration: duration_minutes,
        })
    }

    #[must_use]
    pub fn verbal_questions(&self) -> u32 {
        self.default_verbal_questions
    }

    #[must_use]
    pub fn quantitative_questions(&self) -> u32 {
        self.default_quantitative_questions
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.default_test_duration
    }

    /// A custom configuration prefilled from these defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration rules reject the stored
    /// values. Defaults that passed `new` always satisfy them.
    pub fn custom_test(&self) -> Result<TestConfiguration, ConfigError> {
        TestConfiguration::custom(
            self.default_verbal_questions,
            self.default_quantitative_questions,
            self.default_test_duration,
        )
    }
}
