use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::SectionId;
use crate::model::question::Category;

/// Questions per standard single-category test.
pub const STANDARD_QUESTION_COUNT: u32 = 20;
/// Minutes for a standard single-category test.
pub const STANDARD_DURATION_MINUTES: u32 = 30;
/// Minutes for the full qiyas simulation.
pub const QIYAS_DURATION_MINUTES: u32 = 120;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("test duration must be > 0 minutes")]
    ZeroDuration,

    #[error("qiyas layout needs at least one section")]
    NoSections,

    #[error("{category} sections hold {in_sections} questions but {requested} were requested")]
    SectionCountMismatch {
        category: Category,
        requested: u32,
        in_sections: u32,
    },
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Standard,
    Custom,
    Qiyas,
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestMode::Standard => "standard",
            TestMode::Custom => "custom",
            TestMode::Qiyas => "qiyas",
        })
    }
}

//
// ─── FIXED COUNTS (standard / custom) ──────────────────────────────────────────
//

/// Requested counts for a verbal-then-quantitative test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFixedCounts")]
pub struct FixedCounts {
    verbal_questions: u32,
    quantitative_questions: u32,
    #[serde(rename = "duration")]
    duration_minutes: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFixedCounts {
    #[serde(default)]
    verbal_questions: u32,
    #[serde(default)]
    quantitative_questions: u32,
    duration: u32,
}

impl TryFrom<RawFixedCounts> for FixedCounts {
    type Error = ConfigError;

    fn try_from(raw: RawFixedCounts) -> Result<Self, Self::Error> {
        FixedCounts::new(raw.verbal_questions, raw.quantitative_questions, raw.duration)
    }
}

impl FixedCounts {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDuration` if `duration_minutes` is zero.
    pub fn new(
        verbal_questions: u32,
        quantitative_questions: u32,
        duration_minutes: u32,
    ) -> Result<Self, ConfigError> {
        if duration_minutes == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(Self {
            verbal_questions,
            quantitative_questions,
            duration_minutes,
        })
    }

    #[must_use]
    pub fn verbal_questions(&self) -> u32 {
        self.verbal_questions
    }

    #[must_use]
    pub fn quantitative_questions(&self) -> u32 {
        self.quantitative_questions
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

//
// ─── QIYAS LAYOUT ──────────────────────────────────────────────────────────────
//

/// One block of the qiyas simulation. Its duration is informational: only the
/// overall timer gates progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    #[serde(rename = "type")]
    pub category: Category,
    pub questions_count: u32,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
}

impl Section {
    #[must_use]
    pub fn new(id: u32, category: Category, questions_count: u32, duration_minutes: u32) -> Self {
        Self {
            id: SectionId::new(id),
            category,
            questions_count,
            duration_minutes,
        }
    }
}

/// Ordered sections of a qiyas test plus the overall duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQiyasLayout")]
pub struct QiyasLayout {
    verbal_questions: u32,
    quantitative_questions: u32,
    #[serde(rename = "duration")]
    duration_minutes: u32,
    sections: Vec<Section>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQiyasLayout {
    verbal_questions: Option<u32>,
    quantitative_questions: Option<u32>,
    duration: u32,
    sections: Vec<Section>,
}

impl TryFrom<RawQiyasLayout> for QiyasLayout {
    type Error = ConfigError;

    fn try_from(raw: RawQiyasLayout) -> Result<Self, Self::Error> {
        let verbal = raw
            .verbal_questions
            .unwrap_or_else(|| section_total(&raw.sections, Category::Verbal));
        let quantitative = raw
            .quantitative_questions
            .unwrap_or_else(|| section_total(&raw.sections, Category::Quantitative));
        QiyasLayout::new(verbal, quantitative, raw.duration, raw.sections)
    }
}

fn section_total(sections: &[Section], category: Category) -> u32 {
    sections
        .iter()
        .filter(|s| s.category == category)
        .fold(0_u32, |acc, s| acc.saturating_add(s.questions_count))
}

impl QiyasLayout {
    /// Build a layout, checking that the sections add up to the requested counts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDuration`, `ConfigError::NoSections`, or
    /// `ConfigError::SectionCountMismatch` when a category's section total
    /// differs from its requested count.
    pub fn new(
        verbal_questions: u32,
        quantitative_questions: u32,
        duration_minutes: u32,
        sections: Vec<Section>,
    ) -> Result<Self, ConfigError> {
        if duration_minutes == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if sections.is_empty() {
            return Err(ConfigError::NoSections);
        }
        for (category, requested) in [
            (Category::Verbal, verbal_questions),
            (Category::Quantitative, quantitative_questions),
        ] {
            let in_sections = section_total(&sections, category);
            if in_sections != requested {
                return Err(ConfigError::SectionCountMismatch {
                    category,
                    requested,
                    in_sections,
                });
            }
        }

        Ok(Self {
            verbal_questions,
            quantitative_questions,
            duration_minutes,
            sections,
        })
    }

    /// Build a layout whose requested counts are derived from the sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDuration` or `ConfigError::NoSections`.
    pub fn from_sections(duration_minutes: u32, sections: Vec<Section>) -> Result<Self, ConfigError> {
        let verbal = section_total(&sections, Category::Verbal);
        let quantitative = section_total(&sections, Category::Quantitative);
        Self::new(verbal, quantitative, duration_minutes, sections)
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

//
// ─── CONFIGURATION ─────────────────────────────────────────────────────────────
//

/// What a single test attempt should contain.
///
/// Serialized with the mode under `type`, e.g.
/// `{"type":"custom","verbalQuestions":5,"quantitativeQuestions":3,"duration":10}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestConfiguration {
    Standard(FixedCounts),
    Custom(FixedCounts),
    Qiyas(QiyasLayout),
}

impl TestConfiguration {
    /// Standard single-category test: 20 questions in 30 minutes.
    #[must_use]
    pub fn standard(category: Category) -> Self {
        let (verbal, quantitative) = match category {
            Category::Verbal => (STANDARD_QUESTION_COUNT, 0),
            Category::Quantitative => (0, STANDARD_QUESTION_COUNT),
        };
        Self::Standard(FixedCounts {
            verbal_questions: verbal,
            quantitative_questions: quantitative,
            duration_minutes: STANDARD_DURATION_MINUTES,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::ZeroDuration` if `duration_minutes` is zero.
    pub fn custom(
        verbal_questions: u32,
        quantitative_questions: u32,
        duration_minutes: u32,
    ) -> Result<Self, ConfigError> {
        FixedCounts::new(verbal_questions, quantitative_questions, duration_minutes)
            .map(Self::Custom)
    }

    /// Full exam simulation: ten alternating sections of 13 verbal and
    /// 11 quantitative questions (65 + 55) in 120 minutes.
    #[must_use]
    pub fn qiyas() -> Self {
        let sections = (1..=10)
            .map(|id| {
                if id % 2 == 1 {
                    Section::new(id, Category::Verbal, 13, 13)
                } else {
                    Section::new(id, Category::Quantitative, 11, 11)
                }
            })
            .collect();
        Self::Qiyas(QiyasLayout {
            verbal_questions: 65,
            quantitative_questions: 55,
            duration_minutes: QIYAS_DURATION_MINUTES,
            sections,
        })
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        match self {
            Self::Standard(_) => TestMode::Standard,
            Self::Custom(_) => TestMode::Custom,
            Self::Qiyas(_) => TestMode::Qiyas,
        }
    }

    #[must_use]
    pub fn verbal_questions(&self) -> u32 {
        match self {
            Self::Standard(c) | Self::Custom(c) => c.verbal_questions,
            Self::Qiyas(l) => l.verbal_questions,
        }
    }

    #[must_use]
    pub fn quantitative_questions(&self) -> u32 {
        match self {
            Self::Standard(c) | Self::Custom(c) => c.quantitative_questions,
            Self::Qiyas(l) => l.quantitative_questions,
        }
    }

    #[must_use]
    pub fn requested_total(&self) -> u32 {
        self.verbal_questions()
            .saturating_add(self.quantitative_questions())
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        match self {
            Self::Standard(c) | Self::Custom(c) => c.duration_minutes,
            Self::Qiyas(l) => l.duration_minutes,
        }
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes().saturating_mul(60)
    }

    /// Qiyas sections in order; empty for the other modes.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        match self {
            Self::Qiyas(l) => &l.sections,
            Self::Standard(_) | Self::Custom(_) => &[],
        }
    }
}
