use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// The two sections of the aptitude test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Verbal,
    Quantitative,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Verbal, Category::Quantitative];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Verbal => "verbal",
            Category::Quantitative => "quantitative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question category: {raw}")]
pub struct ParseCategoryError {
    raw: String,
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verbal" | "v" => Ok(Category::Verbal),
            "quantitative" | "q" => Ok(Category::Quantitative),
            _ => Err(ParseCategoryError { raw: s.to_owned() }),
        }
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id} has empty text")]
    EmptyText { id: QuestionId },

    #[error("question {id} needs at least 2 options, got {count}")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id} has a blank option at index {index}")]
    EmptyOption { id: QuestionId, index: usize },

    #[error("question {id}: correct option {index} is out of range for {count} options")]
    CorrectOptionOutOfRange {
        id: QuestionId,
        index: usize,
        count: usize,
    },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    category: Category,
    text: String,
    options: Vec<String>,
    correct_option: usize,
}

impl Question {
    /// Validate and build a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is blank, there are fewer than two
    /// options, an option is blank, or `correct_option` does not index `options`.
    pub fn new(
        id: QuestionId,
        category: Category,
        text: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText { id });
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id,
                count: options.len(),
            });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { id, index });
        }
        if correct_option >= options.len() {
            return Err(QuestionError::CorrectOptionOutOfRange {
                id,
                index: correct_option,
                count: options.len(),
            });
        }

        Ok(Self {
            id,
            category,
            text,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }

    /// Case-insensitive match against the text and every option.
    ///
    /// A blank query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.text.to_lowercase().contains(&query)
            || self
                .options
                .iter()
                .any(|o| o.to_lowercase().contains(&query))
    }
}

/// Wire shape of a question: camelCase names with the category under `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "type")]
    category: Category,
    text: String,
    options: Vec<String>,
    correct_option_index: usize,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.id,
            record.category,
            record.text,
            record.options,
            record.correct_option_index,
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            category: q.category,
            text: q.text,
            options: q.options,
            correct_option_index: q.correct_option,
        }
    }
}
