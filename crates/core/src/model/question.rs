use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, QuestionSetId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("question {question} needs at least 2 options, got {count}")]
    TooFewOptions { question: QuestionId, count: usize },

    #[error("question {question} repeats option {option}")]
    DuplicateOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("option {option} of question {question} has no text")]
    EmptyOptionText {
        question: QuestionId,
        option: OptionId,
    },

    #[error("correct option {option} is not an option of question {question}")]
    UnknownCorrectOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question set {0} has no questions")]
    EmptySet(QuestionSetId),

    #[error("question set {set} repeats question {question}")]
    DuplicateQuestion {
        set: QuestionSetId,
        question: QuestionId,
    },

    #[error("question set title cannot be empty")]
    EmptyTitle,
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One labeled choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
    pub text: String,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: OptionId, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            text: text.into(),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
///
/// Questions are immutable once built; all invariants are checked in [`Question::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<QuestionOption>,
    correct_option: OptionId,
    explanation: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// Prompt and option texts are trimmed; a blank explanation becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, an option id repeats, an option has no text, or `correct_option`
    /// does not name one of the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<QuestionOption>,
        correct_option: OptionId,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt(id));
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                question: id,
                count: options.len(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut normalized = Vec::with_capacity(options.len());
        for option in options {
            if !seen.insert(option.id) {
                return Err(QuestionError::DuplicateOption {
                    question: id,
                    option: option.id,
                });
            }
            let text = option.text.trim().to_owned();
            if text.is_empty() {
                return Err(QuestionError::EmptyOptionText {
                    question: id,
                    option: option.id,
                });
            }
            normalized.push(QuestionOption {
                id: option.id,
                label: option.label.trim().to_owned(),
                text,
            });
        }

        if !seen.contains(&correct_option) {
            return Err(QuestionError::UnknownCorrectOption {
                question: id,
                option: correct_option,
            });
        }

        let explanation = explanation
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty());

        Ok(Self {
            id,
            prompt,
            options: normalized,
            correct_option,
            explanation,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> OptionId {
        self.correct_option
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, option: OptionId) -> bool {
        self.options.iter().any(|o| o.id == option)
    }

    #[must_use]
    pub fn option(&self, option: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option)
    }

    #[must_use]
    pub fn is_correct(&self, option: OptionId) -> bool {
        self.correct_option == option
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// Descriptive metadata shown alongside a question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSetMeta {
    pub title: String,
    pub description: Option<String>,
}

impl QuestionSetMeta {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyTitle` if the title is blank.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, QuestionError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(QuestionError::EmptyTitle);
        }
        Ok(Self {
            title,
            description: description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// Ordered, non-empty collection of questions loaded for one quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    id: QuestionSetId,
    meta: QuestionSetMeta,
    questions: Vec<Question>,
    index: BTreeMap<QuestionId, usize>,
}

impl QuestionSet {
    /// # Errors
    ///
    /// Returns `QuestionError::EmptySet` for an empty list and
    /// `QuestionError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: QuestionSetId,
        meta: QuestionSetMeta,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionError> {
        if questions.is_empty() {
            return Err(QuestionError::EmptySet(id));
        }

        let mut index = BTreeMap::new();
        for (position, question) in questions.iter().enumerate() {
            if index.insert(question.id(), position).is_some() {
                return Err(QuestionError::DuplicateQuestion {
                    set: id,
                    question: question.id(),
                });
            }
        }

        Ok(Self {
            id,
            meta,
            questions,
            index,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionSetId {
        self.id
    }

    #[must_use]
    pub fn meta(&self) -> &QuestionSetMeta {
        &self.meta
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed set; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|&position| &self.questions[position])
    }

    /// Zero-based position of a question in the set order.
    #[must_use]
    pub fn position(&self, id: QuestionId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<QuestionOption> {
        vec![
            QuestionOption::new(OptionId::new(1), "A", "Delhi"),
            QuestionOption::new(OptionId::new(2), "B", "Mumbai"),
        ]
    }

    fn meta() -> QuestionSetMeta {
        QuestionSetMeta::new("General Awareness", None).unwrap()
    }

    #[test]
    fn valid_question_is_normalized() {
        let q = Question::new(
            QuestionId::new(1),
            "  Capital of India?  ",
            options(),
            OptionId::new(1),
            Some("   ".into()),
        )
        .unwrap();

        assert_eq!(q.prompt(), "Capital of India?");
        assert!(q.explanation().is_none());
        assert!(q.is_correct(OptionId::new(1)));
        assert!(!q.is_correct(OptionId::new(2)));
        assert_eq!(q.option(OptionId::new(2)).unwrap().label, "B");
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = Question::new(QuestionId::new(3), " ", options(), OptionId::new(1), None)
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyPrompt(QuestionId::new(3)));
    }

    #[test]
    fn single_option_is_rejected() {
        let err = Question::new(
            QuestionId::new(1),
            "Q",
            vec![QuestionOption::new(OptionId::new(1), "A", "only")],
            OptionId::new(1),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::TooFewOptions { count: 1, .. }));
    }

    #[test]
    fn duplicate_option_is_rejected() {
        let mut opts = options();
        opts.push(QuestionOption::new(OptionId::new(2), "C", "Pune"));
        let err = Question::new(QuestionId::new(1), "Q", opts, OptionId::new(1), None)
            .unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateOption { .. }));
    }

    #[test]
    fn correct_option_must_exist() {
        let err = Question::new(QuestionId::new(1), "Q", options(), OptionId::new(9), None)
            .unwrap_err();
        assert!(matches!(err, QuestionError::UnknownCorrectOption { .. }));
    }

    #[test]
    fn set_rejects_empty_and_duplicates() {
        let err = QuestionSet::new(QuestionSetId::new(1), meta(), Vec::new()).unwrap_err();
        assert_eq!(err, QuestionError::EmptySet(QuestionSetId::new(1)));

        let q = Question::new(QuestionId::new(5), "Q", options(), OptionId::new(1), None).unwrap();
        let err = QuestionSet::new(QuestionSetId::new(1), meta(), vec![q.clone(), q]).unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateQuestion { .. }));
    }

    #[test]
    fn set_looks_up_by_id() {
        let a = Question::new(QuestionId::new(10), "A?", options(), OptionId::new(1), None).unwrap();
        let b = Question::new(QuestionId::new(20), "B?", options(), OptionId::new(2), None).unwrap();
        let set = QuestionSet::new(QuestionSetId::new(1), meta(), vec![a, b]).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.position(QuestionId::new(20)), Some(1));
        assert_eq!(set.question(QuestionId::new(10)).unwrap().prompt(), "A?");
        assert!(!set.contains(QuestionId::new(30)));
    }

    #[test]
    fn blank_title_is_rejected() {
        assert_eq!(
            QuestionSetMeta::new("  ", None).unwrap_err(),
            QuestionError::EmptyTitle
        );
    }
}
