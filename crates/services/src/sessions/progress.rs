use serde::Serialize;

use qudratak_core::model::{Category, SectionId};

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// `position / total` as a whole percentage.
    pub percent: u32,
    pub is_complete: bool,
}

/// The qiyas section the cursor currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionInfo {
    /// 1-based section number.
    pub number: usize,
    pub id: SectionId,
    pub category: Category,
    pub questions: usize,
}
