use chrono::{DateTime, Utc};

use crate::model::answers::AnswerState;
use crate::model::ids::{QuestionSetId, UserId};
use crate::model::result::QuizResult;

/// A completed quiz run as appended to the attempt log.
///
/// Carries the full answer snapshot next to the aggregates so later reviews
/// do not depend on the question set staying unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub set_id: QuestionSetId,
    pub user_id: Option<UserId>,
    pub answers: AnswerState,
    pub result: QuizResult,
    pub completed_at: DateTime<Utc>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(
        set_id: QuestionSetId,
        user_id: Option<UserId>,
        answers: AnswerState,
        result: QuizResult,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            set_id,
            user_id,
            answers,
            result,
            completed_at,
        }
    }
}
