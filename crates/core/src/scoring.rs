//! Scoring of a finished quiz against the correct options.

use thiserror::Error;

use crate::model::{AnswerState, Question, QuizResult};

/// Minimum score (inclusive) that counts as a pass.
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

/// Scores strictly below this line force a retake.
pub const DEFAULT_FORCED_RETAKE_THRESHOLD: f64 = 40.0;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoringPolicyError {
    #[error("threshold must be within 0..=100, got {0}")]
    OutOfRange(f64),

    #[error("forced retake threshold ({forced}) must not exceed pass threshold ({pass})")]
    Inverted { pass: f64, forced: f64 },
}

/// Pass and forced-retake thresholds, in percent.
///
/// The forced-retake line never sits above the pass line, so a forced
/// retake is always also a fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pass_threshold: f64,
    forced_retake_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            forced_retake_threshold: DEFAULT_FORCED_RETAKE_THRESHOLD,
        }
    }
}

impl ScoringPolicy {
    /// # Errors
    ///
    /// Returns `ScoringPolicyError` for thresholds outside `0..=100` or a
    /// forced-retake threshold above the pass threshold.
    pub fn new(pass_threshold: f64, forced_retake_threshold: f64) -> Result<Self, ScoringPolicyError> {
        for value in [pass_threshold, forced_retake_threshold] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ScoringPolicyError::OutOfRange(value));
            }
        }
        if forced_retake_threshold > pass_threshold {
            return Err(ScoringPolicyError::Inverted {
                pass: pass_threshold,
                forced: forced_retake_threshold,
            });
        }
        Ok(Self {
            pass_threshold,
            forced_retake_threshold,
        })
    }

    #[must_use]
    pub fn pass_threshold(&self) -> f64 {
        self.pass_threshold
    }

    #[must_use]
    pub fn forced_retake_threshold(&self) -> f64 {
        self.forced_retake_threshold
    }
}

/// Round to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compare every recorded answer to its question's correct option.
///
/// Unanswered questions count as neither correct nor incorrect. The result is
/// a pure function of its inputs.
#[must_use]
pub fn score(questions: &[Question], answers: &AnswerState, policy: &ScoringPolicy) -> QuizResult {
    let mut correct = 0_u32;
    let mut incorrect = 0_u32;

    for question in questions {
        match answers.get(question.id()) {
            Some(option) if question.is_correct(option) => correct = correct.saturating_add(1),
            Some(_) => incorrect = incorrect.saturating_add(1),
            None => {}
        }
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let score_percentage = if total == 0 {
        0.0
    } else {
        round2(f64::from(correct) / f64::from(total) * 100.0)
    };

    QuizResult::new(
        total,
        correct,
        incorrect,
        score_percentage,
        score_percentage >= policy.pass_threshold,
        score_percentage < policy.forced_retake_threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionId, QuestionId, QuestionOption, Verdict};

    const RIGHT: OptionId = OptionId::new(1);
    const WRONG: OptionId = OptionId::new(2);

    fn questions(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    vec![
                        QuestionOption::new(RIGHT, "A", "right"),
                        QuestionOption::new(WRONG, "B", "wrong"),
                    ],
                    RIGHT,
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    fn answer(n: u64, correct: u64) -> AnswerState {
        AnswerState::from_entries(
            (1..=n).map(|id| (QuestionId::new(id), if id <= correct { RIGHT } else { WRONG })),
        )
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let result = score(&questions(10), &answer(10, 10), &ScoringPolicy::default());
        assert_eq!(result.correct_answers(), 10);
        assert_eq!(result.incorrect_answers(), 0);
        assert_eq!(result.score_percentage(), 100.0);
        assert!(result.passed());
        assert!(!result.forced_retake());
    }

    #[test]
    fn thirty_percent_forces_retake() {
        let result = score(&questions(10), &answer(10, 3), &ScoringPolicy::default());
        assert_eq!(result.score_percentage(), 30.0);
        assert!(!result.passed());
        assert!(result.forced_retake());
        assert_eq!(result.verdict(), Verdict::ForcedRetake);
    }

    #[test]
    fn exactly_fifty_percent_passes() {
        let result = score(&questions(10), &answer(10, 5), &ScoringPolicy::default());
        assert_eq!(result.score_percentage(), 50.0);
        assert!(result.passed());
        assert!(!result.forced_retake());
    }

    #[test]
    fn between_thresholds_is_a_plain_fail() {
        let result = score(&questions(20), &answer(20, 9), &ScoringPolicy::default());
        assert_eq!(result.score_percentage(), 45.0);
        assert_eq!(result.verdict(), Verdict::Failed);
    }

    #[test]
    fn exactly_forty_percent_is_not_forced() {
        let result = score(&questions(10), &answer(10, 4), &ScoringPolicy::default());
        assert!(!result.forced_retake());
        assert!(!result.passed());
    }

    #[test]
    fn score_rounds_to_two_decimals() {
        let result = score(&questions(3), &answer(3, 1), &ScoringPolicy::default());
        assert_eq!(result.score_percentage(), 33.33);
        let result = score(&questions(3), &answer(3, 2), &ScoringPolicy::default());
        assert_eq!(result.score_percentage(), 66.67);
    }

    #[test]
    fn unanswered_questions_count_in_neither_bucket() {
        let answers = AnswerState::from_entries([
            (QuestionId::new(1), RIGHT),
            (QuestionId::new(2), WRONG),
        ]);
        let result = score(&questions(4), &answers, &ScoringPolicy::default());
        assert_eq!(result.total_questions(), 4);
        assert_eq!(result.correct_answers(), 1);
        assert_eq!(result.incorrect_answers(), 1);
        assert_eq!(result.score_percentage(), 25.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let qs = questions(7);
        let answers = answer(7, 4);
        let policy = ScoringPolicy::default();
        assert_eq!(score(&qs, &answers, &policy), score(&qs, &answers, &policy));
    }

    #[test]
    fn forced_retake_never_passes_for_any_score() {
        let qs = questions(25);
        let policy = ScoringPolicy::default();
        for correct in 0..=25 {
            let result = score(&qs, &answer(25, correct), &policy);
            if result.forced_retake() {
                assert!(!result.passed());
            }
        }
    }

    #[test]
    fn inverted_policy_is_rejected() {
        let err = ScoringPolicy::new(40.0, 50.0).unwrap_err();
        assert!(matches!(err, ScoringPolicyError::Inverted { .. }));
        assert!(ScoringPolicy::new(120.0, 40.0).is_err());
        assert!(ScoringPolicy::new(60.0, 60.0).is_ok());
    }
}
