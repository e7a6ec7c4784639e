use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{OptionId, QuestionId};

/// The option a user has selected for each question they touched.
///
/// One entry per question; a later selection for the same question replaces
/// the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerState {
    selections: BTreeMap<QuestionId, OptionId>,
}

impl AnswerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a snapshot from persisted `(question, option)` pairs.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (QuestionId, OptionId)>) -> Self {
        Self {
            selections: entries.into_iter().collect(),
        }
    }

    /// Record a selection, returning the option it replaced.
    pub fn select(&mut self, question: QuestionId, option: OptionId) -> Option<OptionId> {
        self.selections.insert(question, option)
    }

    #[must_use]
    pub fn get(&self, question: QuestionId) -> Option<OptionId> {
        self.selections.get(&question).copied()
    }

    #[must_use]
    pub fn contains(&self, question: QuestionId) -> bool {
        self.selections.contains_key(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Entries in ascending question id order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, OptionId)> + '_ {
        self.selections.iter().map(|(q, o)| (*q, *o))
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }
}

/// Questions whose correctness feedback has been shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    revealed: BTreeSet<QuestionId>,
}

impl RevealState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the question was not revealed before.
    pub fn reveal(&mut self, question: QuestionId) -> bool {
        self.revealed.insert(question)
    }

    #[must_use]
    pub fn contains(&self, question: QuestionId) -> bool {
        self.revealed.contains(&question)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.revealed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.revealed.iter().copied()
    }

    pub fn clear(&mut self) {
        self.revealed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselecting_replaces_previous_choice() {
        let mut answers = AnswerState::new();
        assert_eq!(answers.select(QuestionId::new(1), OptionId::new(2)), None);
        assert_eq!(
            answers.select(QuestionId::new(1), OptionId::new(3)),
            Some(OptionId::new(2))
        );
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(QuestionId::new(1)), Some(OptionId::new(3)));
    }

    #[test]
    fn reveal_reports_first_insertion_only() {
        let mut reveals = RevealState::new();
        assert!(reveals.reveal(QuestionId::new(4)));
        assert!(!reveals.reveal(QuestionId::new(4)));
        assert_eq!(reveals.len(), 1);
    }
}
