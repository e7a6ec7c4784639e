#![forbid(unsafe_code)]

pub mod error;
pub mod history_service;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::{PersistenceError, QuizError};
pub use history_service::AttemptHistoryService;
pub use quiz::{
    FinishedQuiz, PendingRecord, QuizRun, QuizSessionService, QuizSettings, RunAdvance,
    RunOutcome,
};
