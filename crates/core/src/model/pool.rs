use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{Category, Question, QuestionError};

/// Read-only source of questions, partitioned by category.
///
/// Implementations must return the same ordering for the lifetime of a session.
pub trait QuestionPool {
    fn questions_of_category(&self, category: Category) -> &[Question];
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error(transparent)]
    Question(#[from] QuestionError),
}

//
// ─── BANK FILE SHAPE ───────────────────────────────────────────────────────────
//

/// One entry of the question bank file. The category is implied by the list
/// the entry sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
}

/// The question bank as handed over by the data source:
/// `{ "verbal": [...], "quantitative": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    #[serde(default)]
    pub verbal: Vec<BankEntry>,
    #[serde(default)]
    pub quantitative: Vec<BankEntry>,
}

/// Per-category counts of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub verbal: usize,
    pub quantitative: usize,
}

//
// ─── IN-MEMORY POOL ────────────────────────────────────────────────────────────
//

/// Pool backed by two vectors, one per category, in input order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionPool {
    verbal: Vec<Question>,
    quantitative: Vec<Question>,
}

impl InMemoryQuestionPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition already-validated questions by category, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::DuplicateId` if two questions share an id.
    pub fn from_questions(
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<Self, PoolError> {
        let mut pool = Self::new();
        let mut seen = HashSet::new();
        for question in questions {
            if !seen.insert(question.id()) {
                return Err(PoolError::DuplicateId(question.id()));
            }
            match question.category() {
                Category::Verbal => pool.verbal.push(question),
                Category::Quantitative => pool.quantitative.push(question),
            }
        }
        Ok(pool)
    }

    /// Validate every bank entry and build a pool from it.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Question` for the first invalid entry, or
    /// `PoolError::DuplicateId` if ids collide across the two lists.
    pub fn from_bank(bank: QuestionBank) -> Result<Self, PoolError> {
        let verbal = bank
            .verbal
            .into_iter()
            .map(|entry| entry.into_question(Category::Verbal));
        let quantitative = bank
            .quantitative
            .into_iter()
            .map(|entry| entry.into_question(Category::Quantitative));
        let questions = verbal.chain(quantitative).collect::<Result<Vec<_>, _>>()?;
        Self::from_questions(questions)
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total: self.verbal.len() + self.quantitative.len(),
            verbal: self.verbal.len(),
            quantitative: self.quantitative.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.verbal.is_empty() && self.quantitative.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.iter().find(|q| q.id() == id)
    }

    /// All questions whose text or options contain `query`, verbal first.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Question> {
        self.iter().filter(|q| q.matches(query)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.verbal.iter().chain(self.quantitative.iter())
    }
}

impl QuestionPool for InMemoryQuestionPool {
    fn questions_of_category(&self, category: Category) -> &[Question] {
        match category {
            Category::Verbal => &self.verbal,
            Category::Quantitative => &self.quantitative,
        }
    }
}

impl BankEntry {
    fn into_question(self, category: Category) -> Result<Question, QuestionError> {
        Question::new(
            self.id,
            category,
            self.text,
            self.options,
            self.correct_option_index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: u64, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            category,
            format!("Q{id}"),
            vec!["a".into(), "b".into()],
            0,
        )
        .unwrap()
    }

    #[test]
    fn partitions_by_category_preserving_order() {
        let pool = InMemoryQuestionPool::from_questions(vec![
            q(1, Category::Verbal),
            q(2, Category::Quantitative),
            q(3, Category::Verbal),
        ])
        .unwrap();

        let verbal: Vec<u64> = pool
            .questions_of_category(Category::Verbal)
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(verbal, vec![1, 3]);
        assert_eq!(pool.stats(), PoolStats { total: 3, verbal: 2, quantitative: 1 });
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = InMemoryQuestionPool::from_questions(vec![
            q(1, Category::Verbal),
            q(1, Category::Quantitative),
        ])
        .unwrap_err();
        assert_eq!(err, PoolError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn bank_json_loads_with_implied_categories() {
        let json = r#"{
            "verbal": [{"id": 1, "text": "V1", "options": ["a", "b"], "correctOptionIndex": 1}],
            "quantitative": [{"id": 2, "text": "Q1", "options": ["6", "9", "12"], "correctOptionIndex": 1}]
        }"#;
        let bank: QuestionBank = serde_json::from_str(json).unwrap();
        let pool = InMemoryQuestionPool::from_bank(bank).unwrap();

        assert_eq!(pool.get(QuestionId::new(2)).unwrap().category(), Category::Quantitative);
        assert_eq!(pool.search("v1").len(), 1);
    }

    #[test]
    fn invalid_bank_entry_fails_the_whole_load() {
        let bank = QuestionBank {
            verbal: vec![BankEntry {
                id: QuestionId::new(1),
                text: "V".into(),
                options: vec!["only".into()],
                correct_option_index: 0,
            }],
            quantitative: Vec::new(),
        };
        assert!(matches!(
            InMemoryQuestionPool::from_bank(bank),
            Err(PoolError::Question(QuestionError::TooFewOptions { .. }))
        ));
    }
}
