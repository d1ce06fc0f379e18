//! Readers for the two blobs the core receives verbatim: a test configuration
//! and a question bank.

use qudratak_core::model::{InMemoryQuestionPool, QuestionBank, TestConfiguration};
use tracing::debug;

use crate::error::BlobError;

/// Parse a configuration blob such as
/// `{"type":"custom","verbalQuestions":5,"quantitativeQuestions":3,"duration":10}`.
///
/// # Errors
///
/// Returns `BlobError::Json` for malformed JSON or a configuration that fails
/// validation.
pub fn parse_configuration(blob: &str) -> Result<TestConfiguration, BlobError> {
    let config: TestConfiguration = serde_json::from_str(blob)?;
    debug!(mode = %config.mode(), total = config.requested_total(), "parsed test configuration");
    Ok(config)
}

/// Parse a question bank (`{"verbal": [...], "quantitative": [...]}`) into a pool.
///
/// # Errors
///
/// Returns `BlobError::Json` for malformed JSON and `BlobError::Pool` for
/// invalid or duplicated questions.
pub fn parse_question_bank(blob: &str) -> Result<InMemoryQuestionPool, BlobError> {
    let bank: QuestionBank = serde_json::from_str(blob)?;
    let pool = InMemoryQuestionPool::from_bank(bank)?;
    let stats = pool.stats();
    debug!(
        total = stats.total,
        verbal = stats.verbal,
        quantitative = stats.quantitative,
        "loaded question bank"
    );
    Ok(pool)
}
