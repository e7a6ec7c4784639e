//! The trial-question quiz as an explicit state machine.
//!
//! All quiz state lives in one [`QuizSession`] value. Interaction methods take
//! `&mut self` and either apply a transition or return a [`Rejection`] without
//! touching any state; [`QuizSession::step`] wraps them as a pure
//! `(session, event) -> (session, outcome)` reducer.
//!
//! A question is *complete* once its answer has been submitted (revealed).
//! Page gating and finishing both use that definition.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{AnswerState, OptionId, Question, QuestionId, QuestionSet, QuizResult, RevealState};
use crate::paging::{PageSizeError, Paging};
use crate::scoring::{self, ScoringPolicy};

//
// ─── REJECTIONS ────────────────────────────────────────────────────────────────
//

/// Why an interaction left the session unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Rejection {
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),

    #[error("option {option} does not belong to question {question}")]
    UnknownOption {
        question: QuestionId,
        option: OptionId,
    },

    #[error("question {0} has already been revealed")]
    AlreadyRevealed(QuestionId),

    #[error("no option selected for question {0}")]
    NothingSelected(QuestionId),

    #[error("page {page} still has {missing} unanswered question(s)")]
    PageIncomplete { page: usize, missing: usize },

    #[error("{missing} question(s) still unanswered")]
    QuizIncomplete { missing: usize },

    #[error("quiz already finished")]
    AlreadyFinished,

    #[error("no result is being shown")]
    NoResult,

    #[error("score is below the retake line; the quiz must be retaken")]
    RetakeRequired,
}

//
// ─── EVENTS & OUTCOMES ─────────────────────────────────────────────────────────
//

/// User interactions accepted by [`QuizSession::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    Select {
        question: QuestionId,
        option: OptionId,
    },
    Submit(QuestionId),
    AdvancePage,
    RetreatPage,
    Finish,
    DismissResult,
    Retake,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Applied,
    /// Accepted, but there was nothing to change (e.g. resubmitting).
    Unchanged,
    Finished(QuizResult),
    Rejected(Rejection),
}

/// Result of a successful [`QuizSession::advance_page`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageAdvance {
    NextPage(usize),
    Finished(QuizResult),
}

/// Correctness feedback for a revealed question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback<'a> {
    pub selected: OptionId,
    pub correct_option: OptionId,
    pub is_correct: bool,
    pub explanation: Option<&'a str>,
}

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// The result modal shown after finishing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    result: QuizResult,
}

impl ResultView {
    #[must_use]
    pub fn result(&self) -> &QuizResult {
        &self.result
    }

    /// A forced-retake result has no close affordance.
    #[must_use]
    pub fn is_dismissible(&self) -> bool {
        !self.result.forced_retake()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Clone)]
pub struct QuizSession {
    set: Arc<QuestionSet>,
    paging: Paging,
    policy: ScoringPolicy,
    page: usize,
    answers: AnswerState,
    reveals: RevealState,
    just_revealed: BTreeSet<QuestionId>,
    result_view: Option<ResultView>,
    finished: bool,
}

impl QuizSession {
    /// Start a fresh session on page 1 with empty answers.
    ///
    /// # Errors
    ///
    /// Returns `PageSizeError` if `page_size` is zero.
    pub fn new(
        set: Arc<QuestionSet>,
        page_size: usize,
        policy: ScoringPolicy,
    ) -> Result<Self, PageSizeError> {
        let paging = Paging::new(set.len(), page_size)?;
        Ok(Self {
            set,
            paging,
            policy,
            page: 1,
            answers: AnswerState::new(),
            reveals: RevealState::new(),
            just_revealed: BTreeSet::new(),
            result_view: None,
            finished: false,
        })
    }

    // ─── Accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn question_set(&self) -> &QuestionSet {
        &self.set
    }

    #[must_use]
    pub fn paging(&self) -> Paging {
        self.paging
    }

    #[must_use]
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.paging.total_pages()
    }

    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.paging.is_last_page(self.page)
    }

    #[must_use]
    pub fn page_questions(&self, page: usize) -> &[Question] {
        &self.set.questions()[self.paging.page_bounds(page)]
    }

    #[must_use]
    pub fn current_page_questions(&self) -> &[Question] {
        self.page_questions(self.page)
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    #[must_use]
    pub fn reveals(&self) -> &RevealState {
        &self.reveals
    }

    #[must_use]
    pub fn selected(&self, question: QuestionId) -> Option<OptionId> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn is_complete(&self, question: QuestionId) -> bool {
        self.reveals.contains(question)
    }

    /// True if the question was revealed since the last page change.
    #[must_use]
    pub fn was_just_revealed(&self, question: QuestionId) -> bool {
        self.just_revealed.contains(&question)
    }

    /// Feedback for a revealed question; `None` until it is submitted.
    #[must_use]
    pub fn feedback(&self, question: QuestionId) -> Option<AnswerFeedback<'_>> {
        if !self.reveals.contains(question) {
            return None;
        }
        let q = self.set.question(question)?;
        let selected = self.answers.get(question)?;
        Some(AnswerFeedback {
            selected,
            correct_option: q.correct_option(),
            is_correct: q.is_correct(selected),
            explanation: q.explanation(),
        })
    }

    /// Number of questions on `page` that are not yet complete.
    #[must_use]
    pub fn missing_on_page(&self, page: usize) -> usize {
        self.page_questions(page)
            .iter()
            .filter(|q| !self.is_complete(q.id()))
            .count()
    }

    #[must_use]
    pub fn page_complete(&self, page: usize) -> bool {
        self.missing_on_page(page) == 0
    }

    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.reveals.len() == self.set.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn result_view(&self) -> Option<&ResultView> {
        self.result_view.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let completed = self.reveals.len();
        QuizProgress {
            total: self.set.len(),
            completed,
            remaining: self.set.len().saturating_sub(completed),
            page: self.page,
            total_pages: self.total_pages(),
        }
    }

    /// Score the current answers without changing any state.
    #[must_use]
    pub fn score(&self) -> QuizResult {
        scoring::score(self.set.questions(), &self.answers, &self.policy)
    }

    // ─── Transitions ──────────────────────────────────────────────────────────

    /// Record the user's choice for a question that has not been revealed.
    ///
    /// # Errors
    ///
    /// Rejects unknown questions or options and already revealed questions.
    pub fn select_answer(
        &mut self,
        question: QuestionId,
        option: OptionId,
    ) -> Result<(), Rejection> {
        let q = self
            .set
            .question(question)
            .ok_or(Rejection::UnknownQuestion(question))?;
        if !q.has_option(option) {
            return Err(Rejection::UnknownOption { question, option });
        }
        if self.reveals.contains(question) {
            return Err(Rejection::AlreadyRevealed(question));
        }
        self.answers.select(question, option);
        Ok(())
    }

    /// Reveal correctness for a selected question.
    ///
    /// Returns `false` when the question was already revealed.
    ///
    /// # Errors
    ///
    /// Rejects unknown questions and questions without a selection.
    pub fn submit_answer(&mut self, question: QuestionId) -> Result<bool, Rejection> {
        if !self.set.contains(question) {
            return Err(Rejection::UnknownQuestion(question));
        }
        if !self.answers.contains(question) {
            return Err(Rejection::NothingSelected(question));
        }
        if !self.reveals.reveal(question) {
            return Ok(false);
        }
        self.just_revealed.insert(question);
        Ok(true)
    }

    /// Move to the next page, or finish when leaving the last page.
    ///
    /// # Errors
    ///
    /// Rejects while the current page has incomplete questions, and on the
    /// last page while any question of the quiz is incomplete or the quiz has
    /// already been finished.
    pub fn advance_page(&mut self) -> Result<PageAdvance, Rejection> {
        let missing = self.missing_on_page(self.page);
        if missing > 0 {
            return Err(Rejection::PageIncomplete {
                page: self.page,
                missing,
            });
        }

        if self.is_last_page() {
            return self.finish().map(PageAdvance::Finished);
        }

        self.page += 1;
        self.just_revealed.clear();
        Ok(PageAdvance::NextPage(self.page))
    }

    /// Go back one page. Returns `false` when already on page 1 or while a
    /// forced-retake result is showing.
    pub fn retreat_page(&mut self) -> bool {
        let pinned = self
            .result_view
            .as_ref()
            .is_some_and(|view| !view.is_dismissible());
        if self.page <= 1 || pinned {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Score the quiz and open the result view.
    ///
    /// # Errors
    ///
    /// Rejects while any question is incomplete, and when the quiz has already
    /// been finished since the last retake.
    pub fn finish(&mut self) -> Result<QuizResult, Rejection> {
        if self.finished {
            return Err(Rejection::AlreadyFinished);
        }
        let missing = self.set.len().saturating_sub(self.reveals.len());
        if missing > 0 {
            return Err(Rejection::QuizIncomplete { missing });
        }

        let result = self.score();
        self.finished = true;
        self.result_view = Some(ResultView {
            result: result.clone(),
        });
        Ok(result)
    }

    /// Close the result view and discard the in-memory result.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::NoResult` when nothing is shown and
    /// `Rejection::RetakeRequired` for a forced-retake result.
    pub fn dismiss_result(&mut self) -> Result<(), Rejection> {
        let view = self.result_view.as_ref().ok_or(Rejection::NoResult)?;
        if !view.is_dismissible() {
            return Err(Rejection::RetakeRequired);
        }
        self.result_view = None;
        Ok(())
    }

    /// Start over: clear answers and reveals, return to page 1.
    pub fn retake(&mut self) {
        self.answers.clear();
        self.reveals.clear();
        self.just_revealed.clear();
        self.result_view = None;
        self.finished = false;
        self.page = 1;
    }

    /// Apply one event, returning the next session and what happened.
    #[must_use]
    pub fn step(mut self, event: QuizEvent) -> (Self, StepOutcome) {
        let outcome = match event {
            QuizEvent::Select { question, option } => {
                Self::applied(self.select_answer(question, option))
            }
            QuizEvent::Submit(question) => match self.submit_answer(question) {
                Ok(true) => StepOutcome::Applied,
                Ok(false) => StepOutcome::Unchanged,
                Err(rejection) => StepOutcome::Rejected(rejection),
            },
            QuizEvent::AdvancePage => match self.advance_page() {
                Ok(PageAdvance::NextPage(_)) => StepOutcome::Applied,
                Ok(PageAdvance::Finished(result)) => StepOutcome::Finished(result),
                Err(rejection) => StepOutcome::Rejected(rejection),
            },
            QuizEvent::RetreatPage => {
                if self.retreat_page() {
                    StepOutcome::Applied
                } else {
                    StepOutcome::Unchanged
                }
            }
            QuizEvent::Finish => match self.finish() {
                Ok(result) => StepOutcome::Finished(result),
                Err(rejection) => StepOutcome::Rejected(rejection),
            },
            QuizEvent::DismissResult => Self::applied(self.dismiss_result()),
            QuizEvent::Retake => {
                self.retake();
                StepOutcome::Applied
            }
        };
        (self, outcome)
    }

    fn applied(res: Result<(), Rejection>) -> StepOutcome {
        match res {
            Ok(()) => StepOutcome::Applied,
            Err(rejection) => StepOutcome::Rejected(rejection),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("set_id", &self.set.id())
            .field("questions", &self.set.len())
            .field("page", &self.page)
            .field("answered", &self.answers.len())
            .field("revealed", &self.reveals.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionOption, QuestionSetId, QuestionSetMeta};
    use crate::paging::DEFAULT_PAGE_SIZE;

    const RIGHT: OptionId = OptionId::new(1);
    const WRONG: OptionId = OptionId::new(2);

    fn build_set(n: u64) -> Arc<QuestionSet> {
        let questions = (1..=n)
            .map(|id| {
                Question::new(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    vec![
                        QuestionOption::new(RIGHT, "A", "right"),
                        QuestionOption::new(WRONG, "B", "wrong"),
                    ],
                    RIGHT,
                    Some(format!("Because {id}")),
                )
                .unwrap()
            })
            .collect();
        let meta = QuestionSetMeta::new("Trial", None).unwrap();
        Arc::new(QuestionSet::new(QuestionSetId::new(1), meta, questions).unwrap())
    }

    fn session(n: u64) -> QuizSession {
        QuizSession::new(build_set(n), DEFAULT_PAGE_SIZE, ScoringPolicy::default()).unwrap()
    }

    fn answer(session: &mut QuizSession, id: u64, option: OptionId) {
        session.select_answer(QuestionId::new(id), option).unwrap();
        session.submit_answer(QuestionId::new(id)).unwrap();
    }

    fn answer_all(session: &mut QuizSession, n: u64, correct: u64) {
        for id in 1..=n {
            answer(session, id, if id <= correct { RIGHT } else { WRONG });
        }
    }

    #[test]
    fn select_does_not_reveal() {
        let mut s = session(3);
        s.select_answer(QuestionId::new(1), WRONG).unwrap();
        assert_eq!(s.selected(QuestionId::new(1)), Some(WRONG));
        assert!(!s.is_complete(QuestionId::new(1)));
        assert!(s.feedback(QuestionId::new(1)).is_none());
    }

    #[test]
    fn select_rejects_unknown_question_and_option() {
        let mut s = session(3);
        assert_eq!(
            s.select_answer(QuestionId::new(9), RIGHT),
            Err(Rejection::UnknownQuestion(QuestionId::new(9)))
        );
        assert!(matches!(
            s.select_answer(QuestionId::new(1), OptionId::new(7)),
            Err(Rejection::UnknownOption { .. })
        ));
        assert!(s.answers().is_empty());
    }

    #[test]
    fn revealed_answer_is_locked() {
        let mut s = session(3);
        answer(&mut s, 1, WRONG);
        assert_eq!(
            s.select_answer(QuestionId::new(1), RIGHT),
            Err(Rejection::AlreadyRevealed(QuestionId::new(1)))
        );
        assert_eq!(s.selected(QuestionId::new(1)), Some(WRONG));
    }

    #[test]
    fn submit_requires_selection_and_is_idempotent() {
        let mut s = session(3);
        assert_eq!(
            s.submit_answer(QuestionId::new(2)),
            Err(Rejection::NothingSelected(QuestionId::new(2)))
        );
        assert!(s.reveals().is_empty());

        s.select_answer(QuestionId::new(2), RIGHT).unwrap();
        assert_eq!(s.submit_answer(QuestionId::new(2)), Ok(true));
        assert_eq!(s.submit_answer(QuestionId::new(2)), Ok(false));
        assert_eq!(s.reveals().len(), 1);

        let feedback = s.feedback(QuestionId::new(2)).unwrap();
        assert!(feedback.is_correct);
        assert_eq!(feedback.explanation, Some("Because 2"));
    }

    #[test]
    fn reveals_are_always_answered() {
        let mut s = session(12);
        answer_all(&mut s, 10, 4);
        s.select_answer(QuestionId::new(11), RIGHT).unwrap();
        assert!(s.reveals().iter().all(|q| s.answers().contains(q)));
    }

    #[test]
    fn advance_is_gated_on_the_current_page() {
        let mut s = session(20);
        for id in 1..=9 {
            answer(&mut s, id, RIGHT);
        }
        let before = s.progress();
        assert_eq!(
            s.advance_page(),
            Err(Rejection::PageIncomplete {
                page: 1,
                missing: 1
            })
        );
        assert_eq!(s.current_page(), 1);
        assert_eq!(s.progress(), before);

        answer(&mut s, 10, RIGHT);
        assert_eq!(s.advance_page(), Ok(PageAdvance::NextPage(2)));
        assert_eq!(s.current_page(), 2);
        let ids: Vec<u64> = s
            .current_page_questions()
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(ids, (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn selected_but_unsubmitted_does_not_count_for_gating() {
        let mut s = session(10);
        answer_all(&mut s, 9, 9);
        s.select_answer(QuestionId::new(10), RIGHT).unwrap();
        assert!(matches!(
            s.advance_page(),
            Err(Rejection::PageIncomplete { missing: 1, .. })
        ));
        assert!(matches!(
            s.finish(),
            Err(Rejection::QuizIncomplete { missing: 1 })
        ));
    }

    #[test]
    fn page_change_clears_just_revealed_but_keeps_reveals() {
        let mut s = session(15);
        answer_all(&mut s, 10, 10);
        assert!(s.was_just_revealed(QuestionId::new(3)));
        s.advance_page().unwrap();
        assert!(!s.was_just_revealed(QuestionId::new(3)));
        assert!(s.is_complete(QuestionId::new(3)));
    }

    #[test]
    fn retreat_never_goes_below_first_page() {
        let mut s = session(20);
        assert!(!s.retreat_page());
        answer_all(&mut s, 10, 10);
        s.advance_page().unwrap();
        assert!(s.retreat_page());
        assert_eq!(s.current_page(), 1);
        assert!(!s.retreat_page());
    }

    #[test]
    fn advancing_from_last_page_finishes() {
        let mut s = session(10);
        answer_all(&mut s, 10, 10);
        let PageAdvance::Finished(result) = s.advance_page().unwrap() else {
            panic!("expected finish");
        };
        assert_eq!(result.correct_answers(), 10);
        assert_eq!(result.incorrect_answers(), 0);
        assert_eq!(result.score_percentage(), 100.0);
        assert!(result.passed());
        assert!(!result.forced_retake());
        assert!(s.is_finished());
    }

    #[test]
    fn finish_is_rejected_until_everything_is_answered() {
        let mut s = session(20);
        answer_all(&mut s, 10, 10);
        assert_eq!(
            s.finish(),
            Err(Rejection::QuizIncomplete { missing: 10 })
        );
        assert!(s.result_view().is_none());
    }

    #[test]
    fn forced_retake_result_cannot_be_dismissed() {
        let mut s = session(10);
        answer_all(&mut s, 10, 3);
        let result = s.finish().unwrap();
        assert_eq!(result.score_percentage(), 30.0);
        assert!(!result.passed());
        assert!(result.forced_retake());

        assert!(!s.result_view().unwrap().is_dismissible());
        assert_eq!(s.dismiss_result(), Err(Rejection::RetakeRequired));
        assert!(s.result_view().is_some());

        s.retake();
        assert!(s.result_view().is_none());
    }

    #[test]
    fn forced_retake_result_pins_the_page() {
        let mut s = session(20);
        answer_all(&mut s, 20, 2);
        assert_eq!(s.advance_page(), Ok(PageAdvance::NextPage(2)));
        let result = s.finish().unwrap();
        assert!(result.forced_retake());

        assert!(!s.retreat_page());
        let (s, outcome) = s.step(QuizEvent::RetreatPage);
        assert_eq!(outcome, StepOutcome::Unchanged);
        assert_eq!(s.current_page(), 2);
        assert!(s.result_view().is_some());
    }

    #[test]
    fn plain_result_can_be_dismissed_once() {
        let mut s = session(10);
        answer_all(&mut s, 10, 5);
        let result = s.finish().unwrap();
        assert_eq!(result.score_percentage(), 50.0);
        assert!(result.passed());
        assert_eq!(s.dismiss_result(), Ok(()));
        assert_eq!(s.dismiss_result(), Err(Rejection::NoResult));
        assert_eq!(s.finish(), Err(Rejection::AlreadyFinished));
    }

    #[test]
    fn retake_resets_everything() {
        let mut s = session(20);
        answer_all(&mut s, 20, 2);
        s.advance_page().unwrap();
        s.advance_page().unwrap();
        assert!(s.is_finished());

        s.retake();
        assert!(s.answers().is_empty());
        assert!(s.reveals().is_empty());
        assert_eq!(s.current_page(), 1);
        assert!(!s.is_finished());
        assert!(s.result_view().is_none());

        answer_all(&mut s, 20, 20);
        assert!(s.finish().unwrap().passed());
    }

    #[test]
    fn step_reducer_leaves_state_untouched_on_rejection() {
        let s = session(10);
        let (s, outcome) = s.step(QuizEvent::Submit(QuestionId::new(1)));
        assert_eq!(
            outcome,
            StepOutcome::Rejected(Rejection::NothingSelected(QuestionId::new(1)))
        );
        assert!(s.reveals().is_empty());

        let (s, outcome) = s.step(QuizEvent::RetreatPage);
        assert_eq!(outcome, StepOutcome::Unchanged);

        let mut s = s;
        for id in 1..=10 {
            let (next, outcome) = s.step(QuizEvent::Select {
                question: QuestionId::new(id),
                option: RIGHT,
            });
            assert_eq!(outcome, StepOutcome::Applied);
            let (next, outcome) = next.step(QuizEvent::Submit(QuestionId::new(id)));
            assert_eq!(outcome, StepOutcome::Applied);
            s = next;
        }

        let (s, outcome) = s.step(QuizEvent::AdvancePage);
        let StepOutcome::Finished(result) = outcome else {
            panic!("expected finish");
        };
        assert!(result.passed());

        let (s, outcome) = s.step(QuizEvent::Retake);
        assert_eq!(outcome, StepOutcome::Applied);
        assert_eq!(s.progress().completed, 0);
    }

    #[test]
    fn short_last_page_is_handled() {
        let s = QuizSession::new(build_set(23), 10, ScoringPolicy::default()).unwrap();
        assert_eq!(s.total_pages(), 3);
        assert_eq!(s.page_questions(3).len(), 3);
    }
}
