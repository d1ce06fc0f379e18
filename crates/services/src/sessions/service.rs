use chrono::{DateTime, Duration, Utc};
use std::fmt;

use qudratak_core::model::{AttemptId, Question, TestMode};
use qudratak_core::scoring::{self, ExamResult};
use qudratak_core::timer::CompletionReason;

use super::plan::{SectionSpan, SessionPlan};
use super::progress::{ExamProgress, SectionInfo};
use crate::error::{SelectionError, SessionError};

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Completed {
        at: DateTime<Utc>,
        reason: CompletionReason,
    },
}

/// Outcome of a cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved(usize),
    /// `move_prev` at position 0; the cursor did not move.
    AtFirstQuestion,
    /// `move_next` at the final position; the cursor did not move. Callers
    /// treat this as the cue to finish the attempt.
    AtLastQuestion,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt: a fixed question order, one answer slot per question
/// and a cursor.
///
/// Answers are read-only once the session is completed.
pub struct ExamSession {
    id: AttemptId,
    mode: TestMode,
    questions: Vec<Question>,
    answers: Vec<Option<usize>>,
    current: usize,
    sections: Vec<SectionSpan>,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    state: SessionState,
}

impl ExamSession {
    /// Start an attempt from a built plan.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` for an empty plan.
    pub fn new(
        mode: TestMode,
        plan: SessionPlan,
        started_at: DateTime<Utc>,
        duration_seconds: u32,
    ) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::InsufficientQuestions {
                requested: 0,
                available: 0,
            });
        }

        let answers = vec![None; plan.questions.len()];
        Ok(Self {
            id: AttemptId::random(),
            mode,
            questions: plan.questions,
            answers,
            current: 0,
            sections: plan.sections,
            started_at,
            ends_at: started_at + Duration::seconds(i64::from(duration_seconds)),
            state: SessionState::Active,
        })
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> TestMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Completed { .. })
    }

    /// Seconds left until `ends_at`, floored at zero.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        let left = (self.ends_at - now).num_seconds().max(0);
        u32::try_from(left).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn current_position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.current]
    }

    #[must_use]
    pub fn answer_at(&self, position: usize) -> Option<usize> {
        self.answers.get(position).copied().flatten()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    /// Record `option` for the question at `position`, replacing any earlier
    /// choice. Does not move the cursor.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once the attempt is over, and
    /// `SessionError::InvalidSelection` for an out-of-range position or option.
    pub fn select_answer(&mut self, position: usize, option: usize) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        let question = self
            .questions
            .get(position)
            .ok_or(SelectionError::PositionOutOfRange {
                position,
                len: self.questions.len(),
            })?;
        if option >= question.option_count() {
            return Err(SelectionError::OptionOutOfRange {
                position,
                option,
                options: question.option_count(),
            }
            .into());
        }

        self.answers[position] = Some(option);
        Ok(())
    }

    /// `select_answer` at the cursor.
    ///
    /// # Errors
    ///
    /// Same as [`ExamSession::select_answer`].
    pub fn select_current(&mut self, option: usize) -> Result<(), SessionError> {
        self.select_answer(self.current, option)
    }

    pub fn move_next(&mut self) -> Navigation {
        if self.is_last() {
            return Navigation::AtLastQuestion;
        }
        self.current += 1;
        Navigation::Moved(self.current)
    }

    pub fn move_prev(&mut self) -> Navigation {
        if self.current == 0 {
            return Navigation::AtFirstQuestion;
        }
        self.current -= 1;
        Navigation::Moved(self.current)
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        let total = self.questions.len();
        let position = self.current + 1;
        let percent = u32::try_from(position * 100 / total).unwrap_or(100);
        ExamProgress {
            position,
            total,
            answered: self.answered_count(),
            percent,
            is_complete: self.is_complete(),
        }
    }

    /// The qiyas section containing the cursor; `None` outside qiyas mode.
    #[must_use]
    pub fn current_section(&self) -> Option<SectionInfo> {
        self.sections
            .iter()
            .enumerate()
            .find(|(_, span)| span.contains(self.current))
            .map(|(index, span)| SectionInfo {
                number: index + 1,
                id: span.section.id,
                category: span.section.category,
                questions: span.len,
            })
    }

    /// Move to `Completed`. Allowed once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session already completed.
    pub fn complete(
        &mut self,
        reason: CompletionReason,
        at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.state = SessionState::Completed { at, reason };
        Ok(())
    }

    /// Score a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCompleted` while the session is active.
    pub fn score(&self) -> Result<ExamResult, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::NotCompleted);
        }
        Ok(scoring::score(&self.questions, &self.answers)?)
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered_count())
            .field("started_at", &self.started_at)
            .field("ends_at", &self.ends_at)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use qudratak_core::model::{Category, QuestionId, Section};
    use qudratak_core::time::fixed_now;

    fn build_question(id: u64, category: Category) -> Question {
        Question::new(
            QuestionId::new(id),
            category,
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into()],
            2,
        )
        .unwrap()
    }

    fn build_session(len: u64) -> ExamSession {
        let plan = SessionPlan {
            questions: (0..len).map(|i| build_question(i, Category::Verbal)).collect(),
            verbal_selected: len as usize,
            ..SessionPlan::default()
        };
        ExamSession::new(TestMode::Custom, plan, fixed_now(), 600).unwrap()
    }

    #[test]
    fn new_session_starts_at_zero_with_unset_answers() {
        let session = build_session(4);
        assert_eq!(session.current_position(), 0);
        assert_eq!(session.answers(), &[None, None, None, None]);
        assert_eq!(session.ends_at(), fixed_now() + Duration::seconds(600));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let err = ExamSession::new(TestMode::Custom, SessionPlan::default(), fixed_now(), 60)
            .unwrap_err();
        assert!(matches!(err, SessionError::InsufficientQuestions { .. }));
    }

    #[test]
    fn select_is_idempotent_and_overwrites() {
        let mut session = build_session(3);
        session.select_answer(1, 2).unwrap();
        let once = session.answers().to_vec();
        session.select_answer(1, 2).unwrap();
        assert_eq!(session.answers(), once.as_slice());

        session.select_answer(1, 0).unwrap();
        assert_eq!(session.answer_at(1), Some(0));
        assert_eq!(session.current_position(), 0);
    }

    #[test]
    fn out_of_range_selection_fails_fast() {
        let mut session = build_session(2);
        assert!(matches!(
            session.select_answer(2, 0),
            Err(SessionError::InvalidSelection(SelectionError::PositionOutOfRange {
                position: 2,
                len: 2
            }))
        ));
        assert!(matches!(
            session.select_answer(0, 3),
            Err(SessionError::InvalidSelection(SelectionError::OptionOutOfRange {
                option: 3,
                options: 3,
                ..
            }))
        ));
        assert_eq!(session.answers(), &[None, None]);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = build_session(3);
        assert_eq!(session.move_prev(), Navigation::AtFirstQuestion);
        assert_eq!(session.current_position(), 0);

        assert_eq!(session.move_next(), Navigation::Moved(1));
        assert_eq!(session.move_next(), Navigation::Moved(2));
        assert!(session.is_last());
        assert_eq!(session.move_next(), Navigation::AtLastQuestion);
        assert_eq!(session.current_position(), 2);
        assert_eq!(session.move_prev(), Navigation::Moved(1));
    }

    #[test]
    fn revisiting_keeps_selection() {
        let mut session = build_session(2);
        session.select_current(1).unwrap();
        session.move_next();
        session.move_prev();
        assert_eq!(session.current_answer(), Some(1));
    }

    #[test]
    fn completed_session_is_read_only_and_scorable() {
        let mut session = build_session(2);
        session.select_current(2).unwrap();
        assert!(matches!(session.score(), Err(SessionError::NotCompleted)));

        session
            .complete(CompletionReason::FinishedEarly, fixed_now())
            .unwrap();
        assert!(matches!(session.select_answer(1, 2), Err(SessionError::Completed)));
        assert!(matches!(
            session.complete(CompletionReason::TimeExpired, fixed_now()),
            Err(SessionError::Completed)
        ));

        let result = session.score().unwrap();
        assert_eq!(result.correct(), 1);
        assert_eq!(result.percentage(), 50);
        assert!(!result.passed());
    }

    #[test]
    fn progress_reports_position_and_answers() {
        let mut session = build_session(4);
        session.select_current(0).unwrap();
        session.move_next();
        let progress = session.progress();
        assert_eq!(progress.position, 2);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.percent, 50);
        assert!(!progress.is_complete);
    }

    #[test]
    fn current_section_follows_cursor() {
        let questions = vec![
            build_question(1, Category::Verbal),
            build_question(2, Category::Verbal),
            build_question(3, Category::Quantitative),
        ];
        let plan = SessionPlan {
            questions,
            verbal_selected: 2,
            quantitative_selected: 1,
            sections: vec![
                SectionSpan {
                    section: Section::new(1, Category::Verbal, 2, 2),
                    start: 0,
                    len: 2,
                },
                SectionSpan {
                    section: Section::new(2, Category::Quantitative, 1, 1),
                    start: 2,
                    len: 1,
                },
            ],
        };
        let mut session = ExamSession::new(TestMode::Qiyas, plan, fixed_now(), 180).unwrap();

        assert_eq!(session.current_section().unwrap().number, 1);
        session.move_next();
        session.move_next();
        let section = session.current_section().unwrap();
        assert_eq!(section.number, 2);
        assert_eq!(section.category, Category::Quantitative);
    }

    #[test]
    fn non_qiyas_has_no_section() {
        assert_eq!(build_session(2).current_section(), None);
    }

    #[test]
    fn remaining_floors_at_zero() {
        let session = build_session(1);
        assert_eq!(session.remaining_at(fixed_now() + Duration::seconds(30)), 570);
        assert_eq!(session.remaining_at(fixed_now() + Duration::seconds(900)), 0);
    }
}
