mod run;
mod service;
mod settings;

pub use run::{FinishedQuiz, PendingRecord, QuizRun, RunAdvance, RunOutcome};
pub use service::QuizSessionService;
pub use settings::QuizSettings;
