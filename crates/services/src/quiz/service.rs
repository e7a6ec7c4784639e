use std::sync::Arc;

use quiz_core::model::{QuestionSetId, UserId};
use quiz_core::session::QuizSession;
use storage::repository::{AttemptSink, QuestionSource};
use tokio::runtime::Handle;

use super::run::QuizRun;
use super::settings::QuizSettings;
use crate::Clock;
use crate::error::QuizError;

/// Loads question sets and hands out runnable quiz sessions.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    attempts: Arc<dyn AttemptSink>,
    settings: QuizSettings,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        attempts: Arc<dyn AttemptSink>,
    ) -> Self {
        Self {
            clock,
            questions,
            attempts,
            settings: QuizSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Fetch the question set once and start a session on page 1.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DataUnavailable` when the set cannot be loaded or
    /// is malformed, `QuizError::PageSize` for a zero page size, and
    /// `QuizError::NoRuntime` outside a tokio runtime.
    pub async fn start_session(
        &self,
        set_id: QuestionSetId,
        user: Option<UserId>,
    ) -> Result<QuizRun, QuizError> {
        let runtime = Handle::try_current().map_err(|_| QuizError::NoRuntime)?;

        let set = self
            .questions
            .fetch_question_set(set_id)
            .await
            .map_err(|source| {
                tracing::error!(%set_id, error = %source, "question set unavailable");
                QuizError::DataUnavailable { set_id, source }
            })?;

        let session = QuizSession::new(
            Arc::new(set),
            self.settings.page_size,
            self.settings.scoring,
        )?;

        tracing::info!(
            %set_id,
            questions = session.question_set().len(),
            pages = session.total_pages(),
            authenticated = user.is_some(),
            "quiz session started"
        );

        Ok(QuizRun::new(
            session,
            user,
            self.clock,
            Arc::clone(&self.attempts),
            runtime,
        ))
    }
}
