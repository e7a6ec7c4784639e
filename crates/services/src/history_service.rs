use std::sync::Arc;

use quiz_core::model::{QuestionSetId, UserId};
use storage::repository::{AttemptLog, AttemptRow};

use crate::error::QuizError;

/// Read access to previously logged attempts.
#[derive(Clone)]
pub struct AttemptHistoryService {
    log: Arc<dyn AttemptLog>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(log: Arc<dyn AttemptLog>) -> Self {
        Self { log }
    }

    /// Most recent attempts for a set, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the log cannot be read.
    pub async fn recent(
        &self,
        set_id: QuestionSetId,
        user: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, QuizError> {
        Ok(self.log.list_attempts(set_id, user, limit).await?)
    }

    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the log cannot be read.
    pub async fn latest(
        &self,
        set_id: QuestionSetId,
        user: Option<UserId>,
    ) -> Result<Option<AttemptRow>, QuizError> {
        Ok(self.recent(set_id, user, 1).await?.into_iter().next())
    }
}
