use async_trait::async_trait;
use quiz_core::model::{
    OptionId, Question, QuestionId, QuestionOption, QuestionSet, QuestionSetId, QuestionSetMeta,
    QuizAttempt, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Storage identifier for an appended attempt.
///
/// NOTE: This is `i64` to match `SQLite` row IDs.
pub type AttemptId = i64;

//
// ─── PERSISTED RECORDS ─────────────────────────────────────────────────────────
//

/// Loosely typed option as held by the question store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionRecord {
    pub id: Option<u64>,
    pub label: Option<String>,
    pub text: Option<String>,
}

/// Loosely typed question as held by the question store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionRecord {
    pub id: Option<u64>,
    pub prompt: Option<String>,
    pub options: Vec<OptionRecord>,
    pub correct_option_id: Option<u64>,
    pub explanation: Option<String>,
}

/// Loosely typed question set as held by the question store.
///
/// Records may miss fields; [`QuestionSetRecord::into_question_set`] is the one
/// place where defaults are filled in and the result is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionSetRecord {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Vec<QuestionRecord>,
}

/// Label used when an option has none: `A`, `B`, ... then `27`, `28`, ...
fn default_label(position: usize) -> String {
    u8::try_from(position)
        .ok()
        .filter(|p| *p < 26)
        .map_or_else(|| (position + 1).to_string(), |p| char::from(b'A' + p).to_string())
}

impl QuestionSetRecord {
    #[must_use]
    pub fn from_question_set(set: &QuestionSet) -> Self {
        Self {
            id: set.id().value(),
            title: Some(set.meta().title.clone()),
            description: set.meta().description.clone(),
            questions: set
                .questions()
                .iter()
                .map(|q| QuestionRecord {
                    id: Some(q.id().value()),
                    prompt: Some(q.prompt().to_owned()),
                    options: q
                        .options()
                        .iter()
                        .map(|o| OptionRecord {
                            id: Some(o.id.value()),
                            label: Some(o.label.clone()),
                            text: Some(o.text.clone()),
                        })
                        .collect(),
                    correct_option_id: Some(q.correct_option().value()),
                    explanation: q.explanation().map(str::to_owned),
                })
                .collect(),
        }
    }

    /// Fill defaults and validate into a domain `QuestionSet`.
    ///
    /// Defaults: a missing title becomes `Question set <id>`, a missing option
    /// id becomes its 1-based position, a missing label becomes its letter.
    /// Question ids, prompts, option texts and the correct option are required.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` for missing required fields or any
    /// domain validation failure.
    pub fn into_question_set(self) -> Result<QuestionSet, StorageError> {
        let set_id = QuestionSetId::new(self.id);
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Question set {}", self.id));
        let meta = QuestionSetMeta::new(title, self.description).map_err(invalid)?;

        let mut questions = Vec::with_capacity(self.questions.len());
        for (position, record) in self.questions.into_iter().enumerate() {
            let id = record.id.map(QuestionId::new).ok_or_else(|| {
                StorageError::Invalid(format!("question #{} of set {set_id} has no id", position + 1))
            })?;
            let prompt = record
                .prompt
                .ok_or_else(|| StorageError::Invalid(format!("question {id} has no prompt")))?;
            let correct = record
                .correct_option_id
                .map(OptionId::new)
                .ok_or_else(|| StorageError::Invalid(format!("question {id} has no correct option")))?;

            let options = record
                .options
                .into_iter()
                .enumerate()
                .map(|(i, o)| {
                    let option_id = o.id.unwrap_or_else(|| u64::try_from(i + 1).unwrap_or(u64::MAX));
                    QuestionOption::new(
                        OptionId::new(option_id),
                        o.label.unwrap_or_else(|| default_label(i)),
                        o.text.unwrap_or_default(),
                    )
                })
                .collect();

            questions.push(
                Question::new(id, prompt, options, correct, record.explanation).map_err(invalid)?,
            );
        }

        QuestionSet::new(set_id, meta, questions).map_err(invalid)
    }
}

fn invalid<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Invalid(e.to_string())
}

/// Listing entry for stored question sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSetSummary {
    pub id: QuestionSetId,
    pub title: String,
    pub question_count: u32,
}

/// An appended attempt together with its storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRow {
    pub id: AttemptId,
    pub attempt: QuizAttempt,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, attempt: QuizAttempt) -> Self {
        Self { id, attempt }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Read side of the question store, used once per quiz session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch and validate a full question set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id and
    /// `StorageError::Invalid` if the stored records are malformed.
    async fn fetch_question_set(&self, id: QuestionSetId) -> Result<QuestionSet, StorageError>;
}

/// Authoring side of the question store.
#[async_trait]
pub trait QuestionSetRepository: Send + Sync {
    /// Validate and store a question set, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Invalid` if the record does not validate, or
    /// other storage errors.
    async fn upsert_question_set(
        &self,
        record: &QuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError>;

    /// List stored sets ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_question_sets(&self, limit: u32) -> Result<Vec<QuestionSetSummary>, StorageError>;
}

/// Append-only attempt log writer.
#[async_trait]
pub trait AttemptSink: Send + Sync {
    /// Append a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn record_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError>;
}

/// Read access to the attempt log.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError>;

    /// Attempts for a set, newest first, optionally narrowed to one user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_attempts(
        &self,
        set_id: QuestionSetId,
        user_id: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sets: Arc<Mutex<HashMap<QuestionSetId, QuestionSetRecord>>>,
    attempts: Arc<Mutex<Vec<AttemptRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record exactly as given, without validation.
    ///
    /// Mirrors a hosted table that may hold incomplete rows; validation
    /// happens when the set is fetched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_record(&self, record: QuestionSetRecord) -> Result<(), StorageError> {
        let mut guard = self
            .sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(QuestionSetId::new(record.id), record);
        Ok(())
    }
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn fetch_question_set(&self, id: QuestionSetId) -> Result<QuestionSet, StorageError> {
        let record = {
            let guard = self
                .sets
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(&id).cloned().ok_or(StorageError::NotFound)?
        };
        record.into_question_set()
    }
}

#[async_trait]
impl QuestionSetRepository for InMemoryRepository {
    async fn upsert_question_set(
        &self,
        record: &QuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError> {
        let set = record.clone().into_question_set()?;
        self.put_record(QuestionSetRecord::from_question_set(&set))?;
        Ok(set.id())
    }

    async fn list_question_sets(&self, limit: u32) -> Result<Vec<QuestionSetSummary>, StorageError> {
        let guard = self
            .sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut out: Vec<_> = guard
            .values()
            .map(|r| QuestionSetSummary {
                id: QuestionSetId::new(r.id),
                title: r
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Question set {}", r.id)),
                question_count: u32::try_from(r.questions.len()).unwrap_or(u32::MAX),
            })
            .collect();
        out.sort_by_key(|s| s.id);
        out.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(out)
    }
}

#[async_trait]
impl AttemptSink for InMemoryRepository {
    async fn record_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = AttemptId::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))?;
        guard.push(AttemptRow::new(id, attempt.clone()));
        Ok(id)
    }
}

#[async_trait]
impl AttemptLog for InMemoryRepository {
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        set_id: QuestionSetId,
        user_id: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|row| row.attempt.set_id == set_id)
            .filter(|row| user_id.is_none() || row.attempt.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.attempt
                .completed_at
                .cmp(&a.attempt.completed_at)
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionSource>,
    pub question_sets: Arc<dyn QuestionSetRepository>,
    pub attempts: Arc<dyn AttemptSink>,
    pub attempt_log: Arc<dyn AttemptLog>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            question_sets: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            attempt_log: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::AnswerState;
    use quiz_core::scoring::{ScoringPolicy, score};
    use quiz_core::time::fixed_now;

    fn option(id: u64, text: &str) -> OptionRecord {
        OptionRecord {
            id: Some(id),
            label: None,
            text: Some(text.into()),
        }
    }

    fn record(id: u64) -> QuestionSetRecord {
        QuestionSetRecord {
            id,
            title: Some("Reasoning".into()),
            description: None,
            questions: vec![
                QuestionRecord {
                    id: Some(1),
                    prompt: Some("2 + 2?".into()),
                    options: vec![option(1, "3"), option(2, "4")],
                    correct_option_id: Some(2),
                    explanation: None,
                },
                QuestionRecord {
                    id: Some(2),
                    prompt: Some("Odd one out?".into()),
                    options: vec![option(1, "Cat"), option(2, "Dog"), option(3, "Car")],
                    correct_option_id: Some(3),
                    explanation: Some("Not an animal".into()),
                },
            ],
        }
    }

    #[test]
    fn record_fills_defaults_in_one_place() {
        let mut rec = record(4);
        rec.title = None;
        rec.questions[0].options = vec![
            OptionRecord {
                id: None,
                label: None,
                text: Some("3".into()),
            },
            OptionRecord {
                id: None,
                label: None,
                text: Some("4".into()),
            },
        ];

        let set = rec.into_question_set().unwrap();
        assert_eq!(set.meta().title, "Question set 4");
        let first = &set.questions()[0];
        assert_eq!(first.options()[0].id, OptionId::new(1));
        assert_eq!(first.options()[1].label, "B");
        assert!(first.is_correct(OptionId::new(2)));
    }

    #[test]
    fn record_missing_required_fields_fails_fast() {
        let mut rec = record(1);
        rec.questions[1].correct_option_id = None;
        assert!(matches!(
            rec.into_question_set(),
            Err(StorageError::Invalid(_))
        ));

        let mut rec = record(1);
        rec.questions[0].prompt = None;
        assert!(matches!(
            rec.into_question_set(),
            Err(StorageError::Invalid(_))
        ));

        let mut rec = record(1);
        rec.questions.clear();
        assert!(matches!(
            rec.into_question_set(),
            Err(StorageError::Invalid(_))
        ));
    }

    #[test]
    fn record_parses_from_sparse_json() {
        let json = r#"{
            "id": 9,
            "questions": [
                { "id": 1, "prompt": "Sky colour?", "correct_option_id": 2,
                  "options": [ { "text": "Green" }, { "text": "Blue" } ] }
            ]
        }"#;
        let rec: QuestionSetRecord = serde_json::from_str(json).unwrap();
        let set = rec.into_question_set().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.questions()[0].options()[0].label, "A");
    }

    #[test]
    fn default_labels_run_past_the_alphabet() {
        assert_eq!(default_label(0), "A");
        assert_eq!(default_label(25), "Z");
        assert_eq!(default_label(26), "27");
    }

    #[tokio::test]
    async fn fetch_unknown_set_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .fetch_question_set(QuestionSetId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn malformed_stored_record_fails_on_fetch() {
        let repo = InMemoryRepository::new();
        let mut rec = record(3);
        rec.questions[0].id = None;
        repo.put_record(rec).unwrap();

        let err = repo
            .fetch_question_set(QuestionSetId::new(3))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));
    }

    #[tokio::test]
    async fn upsert_then_fetch_round_trips() {
        let repo = InMemoryRepository::new();
        let id = repo.upsert_question_set(&record(5)).await.unwrap();
        let set = repo.fetch_question_set(id).await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.questions()[1].explanation(), Some("Not an animal"));

        let listed = repo.list_question_sets(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].question_count, 2);
    }

    #[tokio::test]
    async fn attempts_are_listed_newest_first_per_user() {
        let repo = InMemoryRepository::new();
        let set = record(1).into_question_set().unwrap();
        let policy = ScoringPolicy::default();
        let user = UserId::random();

        for (offset, user_id) in [(0, Some(user)), (1, None), (2, Some(user))] {
            let answers = AnswerState::from_entries([(QuestionId::new(1), OptionId::new(2))]);
            let result = score(set.questions(), &answers, &policy);
            let attempt = QuizAttempt::new(
                set.id(),
                user_id,
                answers,
                result,
                fixed_now() + chrono::Duration::minutes(offset),
            );
            repo.record_attempt(&attempt).await.unwrap();
        }

        let all = repo.list_attempts(set.id(), None, 10).await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let mine = repo.list_attempts(set.id(), Some(user), 10).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.attempt.user_id == Some(user)));

        let fetched = repo.get_attempt(2).await.unwrap();
        assert_eq!(fetched.user_id, None);
        assert_eq!(fetched.result.correct_answers(), 1);
    }
}
