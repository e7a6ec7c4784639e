use std::sync::Arc;

use quiz_core::model::{
    OptionId, QuestionId, QuestionSetId, QuizAttempt, QuizResult, UserId,
};
use quiz_core::session::{PageAdvance, QuizEvent, QuizSession, Rejection, StepOutcome};
use storage::repository::{AttemptId, AttemptSink};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::Clock;
use crate::error::PersistenceError;

/// Handle to an attempt being written in the background.
///
/// Dropping it detaches the write; the outcome is still logged.
#[derive(Debug)]
pub struct PendingRecord {
    task: JoinHandle<Result<AttemptId, PersistenceError>>,
}

impl PendingRecord {
    /// Wait for the write to settle.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` when the sink failed or the task was
    /// cancelled before completing. Both are logged.
    pub async fn wait(self) -> Result<AttemptId, PersistenceError> {
        self.task.await.map_err(|err| {
            tracing::warn!(error = %err, "attempt recording task did not complete");
            PersistenceError::Interrupted
        })?
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// A finished quiz: the locally computed result plus its pending log entry.
#[derive(Debug)]
pub struct FinishedQuiz {
    pub result: QuizResult,
    pub record: PendingRecord,
}

#[derive(Debug)]
pub enum RunAdvance {
    NextPage(usize),
    Finished(FinishedQuiz),
}

/// What a single event did to the run.
#[derive(Debug)]
pub enum RunOutcome {
    Applied,
    Unchanged,
    Finished(FinishedQuiz),
    Rejected(Rejection),
}

/// A quiz in progress, bound to the attempt sink that logs its finishes.
pub struct QuizRun {
    session: QuizSession,
    user: Option<UserId>,
    clock: Clock,
    attempts: Arc<dyn AttemptSink>,
    runtime: Handle,
}

impl QuizRun {
    pub(crate) fn new(
        session: QuizSession,
        user: Option<UserId>,
        clock: Clock,
        attempts: Arc<dyn AttemptSink>,
        runtime: Handle,
    ) -> Self {
        Self {
            session,
            user,
            clock,
            attempts,
            runtime,
        }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn set_id(&self) -> QuestionSetId {
        self.session.question_set().id()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    /// # Errors
    ///
    /// See `QuizSession::select_answer`.
    pub fn select_answer(
        &mut self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<(), Rejection> {
        self.session.select_answer(question, option)
    }

    /// # Errors
    ///
    /// See `QuizSession::submit_answer`.
    pub fn submit_answer(&mut self, question: QuestionId) -> Result<bool, Rejection> {
        self.session.submit_answer(question)
    }

    /// Move forward, recording the attempt when this leaves the last page.
    ///
    /// # Errors
    ///
    /// See `QuizSession::advance_page`.
    pub fn advance_page(&mut self) -> Result<RunAdvance, Rejection> {
        match self.session.advance_page()? {
            PageAdvance::NextPage(page) => Ok(RunAdvance::NextPage(page)),
            PageAdvance::Finished(result) => Ok(RunAdvance::Finished(self.record(result))),
        }
    }

    pub fn retreat_page(&mut self) -> bool {
        self.session.retreat_page()
    }

    /// Score the quiz and record the attempt in the background.
    ///
    /// # Errors
    ///
    /// See `QuizSession::finish`.
    pub fn finish(&mut self) -> Result<FinishedQuiz, Rejection> {
        let result = self.session.finish()?;
        Ok(self.record(result))
    }

    /// # Errors
    ///
    /// See `QuizSession::dismiss_result`.
    pub fn dismiss_result(&mut self) -> Result<(), Rejection> {
        self.session.dismiss_result()
    }

    pub fn retake(&mut self) {
        tracing::info!(set_id = %self.set_id(), "quiz retake");
        self.session.retake();
    }

    /// Apply one event through the session reducer.
    pub fn apply(&mut self, event: QuizEvent) -> RunOutcome {
        if matches!(event, QuizEvent::Retake) {
            self.retake();
            return RunOutcome::Applied;
        }
        let (next, outcome) = self.session.clone().step(event);
        self.session = next;
        match outcome {
            StepOutcome::Applied => RunOutcome::Applied,
            StepOutcome::Unchanged => RunOutcome::Unchanged,
            StepOutcome::Finished(result) => RunOutcome::Finished(self.record(result)),
            StepOutcome::Rejected(rejection) => RunOutcome::Rejected(rejection),
        }
    }

    // Persistence failure is logged and handed back on the record handle; the
    // result returned to the caller is always the local one.
    fn record(&self, result: QuizResult) -> FinishedQuiz {
        let attempt = QuizAttempt::new(
            self.set_id(),
            self.user,
            self.session.answers().clone(),
            result.clone(),
            self.clock.now(),
        );

        tracing::info!(
            set_id = %attempt.set_id,
            score = result.score_percentage(),
            verdict = ?result.verdict(),
            "quiz finished"
        );

        let sink = Arc::clone(&self.attempts);
        let task = self.runtime.spawn(async move {
            match sink.record_attempt(&attempt).await {
                Ok(id) => {
                    tracing::debug!(attempt_id = id, set_id = %attempt.set_id, "attempt recorded");
                    Ok(id)
                }
                Err(err) => {
                    tracing::warn!(
                        set_id = %attempt.set_id,
                        error = %err,
                        "failed to record quiz attempt"
                    );
                    Err(PersistenceError::from(err))
                }
            }
        });

        FinishedQuiz {
            result,
            record: PendingRecord { task },
        }
    }
}

impl std::fmt::Debug for QuizRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRun")
            .field("session", &self.session)
            .field("user", &self.user)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
