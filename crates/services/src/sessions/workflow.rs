use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use qudratak_core::model::{QuestionId, QuestionPool, TestConfiguration};
use qudratak_core::scoring::ExamResult;
use qudratak_core::timer::CompletionReason;

use super::countdown::{CountdownTask, TimerEvent};
use super::plan::{SelectionPolicy, SessionBuilder};
use super::service::ExamSession;
use crate::Clock;
use crate::error::SessionError;

/// An active session together with the countdown that will end it.
#[derive(Debug)]
pub struct TimedExam {
    pub session: ExamSession,
    pub timer: CountdownTask,
    pub events: mpsc::UnboundedReceiver<TimerEvent>,
}

impl TimedExam {
    /// Ask the countdown to complete early. The matching
    /// `TimerEvent::Completed(FinishedEarly)` arrives on `events`.
    pub fn finish_now(&mut self) -> bool {
        self.timer.finish_now()
    }

    /// Discard the attempt. The countdown stops without a completion signal
    /// and nothing is scored.
    pub fn abandon(self) {
        info!(attempt = %self.session.id(), "attempt abandoned");
        self.timer.cancel();
    }
}

/// Orchestrates session start, completion and scoring.
#[derive(Clone)]
pub struct ExamService {
    clock: Clock,
    pool: Arc<dyn QuestionPool + Send + Sync>,
}

impl ExamService {
    #[must_use]
    pub fn new(clock: Clock, pool: Arc<dyn QuestionPool + Send + Sync>) -> Self {
        Self { clock, pool }
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Build a session in pool order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` when nothing could be
    /// selected; no session is created in that case.
    pub fn start(&self, config: &TestConfiguration) -> Result<ExamSession, SessionError> {
        self.start_with(config, SelectionPolicy::InPoolOrder, &mut rand::rng())
    }

    /// Build a practice session: skip `seen` questions and shuffle the rest.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` when every eligible
    /// question was excluded.
    pub fn start_practice(
        &self,
        config: &TestConfiguration,
        seen: &HashSet<QuestionId>,
    ) -> Result<ExamSession, SessionError> {
        let policy = SelectionPolicy::ShuffleUnseen { seen: seen.clone() };
        self.start_with(config, policy, &mut rand::rng())
    }

    /// Build a session with an explicit policy and RNG.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientQuestions` when nothing could be selected.
    pub fn start_with<R: Rng + ?Sized>(
        &self,
        config: &TestConfiguration,
        policy: SelectionPolicy,
        rng: &mut R,
    ) -> Result<ExamSession, SessionError> {
        let plan = SessionBuilder::new(self.pool.as_ref())
            .with_policy(policy)
            .build_with_rng(config, rng)?;
        let session = ExamSession::new(
            config.mode(),
            plan,
            self.clock.now(),
            config.duration_seconds(),
        )?;
        info!(
            attempt = %session.id(),
            mode = %config.mode(),
            questions = session.total_questions(),
            minutes = config.duration_minutes(),
            "attempt started"
        );
        Ok(session)
    }

    /// Build a session and start its countdown on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Same as [`ExamService::start_with`]; the countdown is only spawned
    /// once the session exists.
    pub fn start_timed(
        &self,
        config: &TestConfiguration,
        policy: SelectionPolicy,
    ) -> Result<TimedExam, SessionError> {
        let session = self.start_with(config, policy, &mut rand::rng())?;
        let (timer, events) = CountdownTask::spawn(config.duration_seconds());
        Ok(TimedExam {
            session,
            timer,
            events,
        })
    }

    /// Complete the session (if still active) and score it.
    ///
    /// # Errors
    ///
    /// Propagates scoring errors; never fails for sessions built by this service.
    pub fn finish(
        &self,
        session: &mut ExamSession,
        reason: CompletionReason,
    ) -> Result<ExamResult, SessionError> {
        if session.is_complete() {
            debug!(attempt = %session.id(), "finish on already completed attempt");
        } else {
            session.complete(reason, self.clock.now())?;
        }
        let result = session.score()?;
        info!(
            attempt = %session.id(),
            ?reason,
            correct = result.correct(),
            total = result.total(),
            percentage = result.percentage(),
            passed = result.passed(),
            "attempt completed"
        );
        Ok(result)
    }

    /// Finish a timed attempt, stopping its countdown first.
    ///
    /// # Errors
    ///
    /// Same as [`ExamService::finish`].
    pub fn finish_timed(
        &self,
        mut exam: TimedExam,
        reason: CompletionReason,
    ) -> Result<(ExamSession, ExamResult), SessionError> {
        exam.timer.finish_now();
        let result = self.finish(&mut exam.session, reason)?;
        Ok((exam.session, result))
    }
}
