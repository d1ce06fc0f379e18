use serde::Serialize;
use thiserror::Error;

use crate::model::{Category, Question, QuestionId};

/// Percentage at or above which an attempt passes.
pub const PASS_THRESHOLD_PERCENT: u32 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("cannot score an attempt without questions")]
    Empty,

    #[error("{answers} answer slots for {questions} questions")]
    LengthMismatch { questions: usize, answers: usize },
}

/// One question of a finished attempt, as shown on the review screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub position: usize,
    pub question_id: QuestionId,
    pub category: Category,
    pub correct_option: usize,
    /// `None` means the question was left unanswered.
    pub chosen_option: Option<usize>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CategoryScore {
    pub total: usize,
    pub correct: usize,
}

/// Derived outcome of an attempt. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    total: usize,
    correct: usize,
    answered: usize,
    percentage: u32,
    passed: bool,
    verbal: CategoryScore,
    quantitative: CategoryScore,
    review: Vec<ReviewItem>,
}

impl ExamResult {
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn answered(&self) -> usize {
        self.answered
    }

    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total - self.answered
    }

    /// Wrong or unanswered.
    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn category(&self, category: Category) -> CategoryScore {
        match category {
            Category::Verbal => self.verbal,
            Category::Quantitative => self.quantitative,
        }
    }

    /// Every question in attempt order.
    #[must_use]
    pub fn review_all(&self) -> &[ReviewItem] {
        &self.review
    }

    /// Only the questions answered wrongly or left unset.
    pub fn review_errors(&self) -> impl Iterator<Item = &ReviewItem> {
        self.review.iter().filter(|item| !item.is_correct)
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.review.iter().map(|item| item.question_id)
    }
}

/// Score `answers` against `questions` position by position.
///
/// An unset slot always counts as incorrect.
///
/// # Errors
///
/// Returns `ScoreError::Empty` for an empty attempt and
/// `ScoreError::LengthMismatch` when the slices differ in length.
pub fn score(questions: &[Question], answers: &[Option<usize>]) -> Result<ExamResult, ScoreError> {
    if questions.is_empty() {
        return Err(ScoreError::Empty);
    }
    if questions.len() != answers.len() {
        return Err(ScoreError::LengthMismatch {
            questions: questions.len(),
            answers: answers.len(),
        });
    }

    let mut verbal = CategoryScore::default();
    let mut quantitative = CategoryScore::default();
    let mut review = Vec::with_capacity(questions.len());

    for (position, (question, answer)) in questions.iter().zip(answers).enumerate() {
        let is_correct = answer.is_some_and(|chosen| question.is_correct(chosen));
        let bucket = match question.category() {
            Category::Verbal => &mut verbal,
            Category::Quantitative => &mut quantitative,
        };
        bucket.total += 1;
        if is_correct {
            bucket.correct += 1;
        }
        review.push(ReviewItem {
            position,
            question_id: question.id(),
            category: question.category(),
            correct_option: question.correct_option(),
            chosen_option: *answer,
            is_correct,
        });
    }

    let total = questions.len();
    let correct = verbal.correct + quantitative.correct;
    let answered = answers.iter().filter(|a| a.is_some()).count();
    let percentage = rounded_percentage(correct, total);

    Ok(ExamResult {
        total,
        correct,
        answered,
        percentage,
        passed: percentage >= PASS_THRESHOLD_PERCENT,
        verbal,
        quantitative,
        review,
    })
}

/// `round(correct / total * 100)`, halves rounded up. `total` must be > 0.
fn rounded_percentage(correct: usize, total: usize) -> u32 {
    let scaled = (correct as u64 * 200 + total as u64) / (total as u64 * 2);
    u32::try_from(scaled).unwrap_or(100)
}
