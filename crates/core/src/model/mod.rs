mod answers;
mod attempt;
mod ids;
mod question;
mod result;

pub use answers::{AnswerState, RevealState};
pub use attempt::QuizAttempt;
pub use ids::{OptionId, ParseIdError, QuestionId, QuestionSetId, UserId};
pub use question::{Question, QuestionError, QuestionOption, QuestionSet, QuestionSetMeta};
pub use result::{QuizResult, QuizResultError, Verdict};
