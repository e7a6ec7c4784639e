//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuestionSetId;
use quiz_core::paging::PageSizeError;
use storage::repository::StorageError;

/// Errors emitted while starting or querying quizzes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    /// The question set could not be loaded; the quiz cannot be displayed.
    #[error("question set {set_id} is unavailable")]
    DataUnavailable {
        set_id: QuestionSetId,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    PageSize(#[from] PageSizeError),
    #[error("quiz sessions must be started inside a tokio runtime")]
    NoRuntime,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure to save a finished attempt. Never changes the result shown.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("failed to record attempt: {0}")]
    Storage(#[from] StorageError),
    #[error("attempt recording task did not complete")]
    Interrupted,
}
