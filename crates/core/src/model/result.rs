use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("correct ({correct}) + incorrect ({incorrect}) exceeds total ({total})")]
    CountMismatch {
        total: u32,
        correct: u32,
        incorrect: u32,
    },

    #[error("score percentage out of range: {0}")]
    InvalidScore(f64),

    #[error("a forced retake cannot also be a pass")]
    InconsistentVerdict,
}

/// How a finished quiz is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    /// Below the pass line; retaking is optional.
    Failed,
    /// Below the forced-retake line; the result view stays open until a retake.
    ForcedRetake,
}

/// Aggregate outcome of a finished quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizResult {
    total_questions: u32,
    correct_answers: u32,
    incorrect_answers: u32,
    score_percentage: f64,
    passed: bool,
    forced_retake: bool,
}

impl QuizResult {
    pub(crate) fn new(
        total_questions: u32,
        correct_answers: u32,
        incorrect_answers: u32,
        score_percentage: f64,
        passed: bool,
        forced_retake: bool,
    ) -> Self {
        Self {
            total_questions,
            correct_answers,
            incorrect_answers,
            score_percentage,
            passed,
            forced_retake,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if counts exceed the total, the score is outside
    /// `0..=100`, or the record claims both a pass and a forced retake.
    pub fn from_persisted(
        total_questions: u32,
        correct_answers: u32,
        incorrect_answers: u32,
        score_percentage: f64,
        passed: bool,
        forced_retake: bool,
    ) -> Result<Self, QuizResultError> {
        if correct_answers.saturating_add(incorrect_answers) > total_questions {
            return Err(QuizResultError::CountMismatch {
                total: total_questions,
                correct: correct_answers,
                incorrect: incorrect_answers,
            });
        }
        if !(0.0..=100.0).contains(&score_percentage) {
            return Err(QuizResultError::InvalidScore(score_percentage));
        }
        if passed && forced_retake {
            return Err(QuizResultError::InconsistentVerdict);
        }
        Ok(Self::new(
            total_questions,
            correct_answers,
            incorrect_answers,
            score_percentage,
            passed,
            forced_retake,
        ))
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> u32 {
        self.incorrect_answers
    }

    #[must_use]
    pub fn score_percentage(&self) -> f64 {
        self.score_percentage
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn forced_retake(&self) -> bool {
        self.forced_retake
    }

    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.forced_retake {
            Verdict::ForcedRetake
        } else if self.passed {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_result_validates_counts() {
        let err = QuizResult::from_persisted(10, 6, 5, 60.0, true, false).unwrap_err();
        assert!(matches!(err, QuizResultError::CountMismatch { .. }));
    }

    #[test]
    fn persisted_result_rejects_pass_with_forced_retake() {
        let err = QuizResult::from_persisted(10, 3, 7, 30.0, true, true).unwrap_err();
        assert_eq!(err, QuizResultError::InconsistentVerdict);
    }

    #[test]
    fn verdict_follows_flags() {
        let pass = QuizResult::from_persisted(4, 2, 2, 50.0, true, false).unwrap();
        let fail = QuizResult::from_persisted(100, 45, 55, 45.0, false, false).unwrap();
        let forced = QuizResult::from_persisted(10, 3, 7, 30.0, false, true).unwrap();
        assert_eq!(pass.verdict(), Verdict::Passed);
        assert_eq!(fail.verdict(), Verdict::Failed);
        assert_eq!(forced.verdict(), Verdict::ForcedRetake);
    }
}
