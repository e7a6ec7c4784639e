use quiz_core::model::{AnswerState, OptionId, QuestionId, QuestionSetId, QuizAttempt, QuizResult, UserId};
use serde::{Deserialize, Serialize};
use sqlx::Row;

use crate::repository::{AttemptRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// One `(question, option)` pair in the stored answers snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct AnswerEntry {
    question_id: QuestionId,
    option_id: OptionId,
}

/// Encodes answers as a JSON array of `{question_id, option_id}` objects.
pub(crate) fn encode_answers(answers: &AnswerState) -> Result<String, StorageError> {
    let entries: Vec<AnswerEntry> = answers
        .iter()
        .map(|(question_id, option_id)| AnswerEntry {
            question_id,
            option_id,
        })
        .collect();
    serde_json::to_string(&entries).map_err(ser)
}

pub(crate) fn decode_answers(raw: &str) -> Result<AnswerState, StorageError> {
    let entries: Vec<AnswerEntry> = serde_json::from_str(raw).map_err(ser)?;
    Ok(AnswerState::from_entries(
        entries.into_iter().map(|e| (e.question_id, e.option_id)),
    ))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<AttemptRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let set_id = QuestionSetId::new(u64_from_i64("set_id", row.try_get("set_id").map_err(ser)?)?);
    let user_id = row
        .try_get::<Option<String>, _>("user_id")
        .map_err(ser)?
        .map(|raw| raw.parse::<UserId>().map_err(ser))
        .transpose()?;
    let answers = decode_answers(&row.try_get::<String, _>("answers").map_err(ser)?)?;

    let result = QuizResult::from_persisted(
        u32_from_i64("total_questions", row.try_get("total_questions").map_err(ser)?)?,
        u32_from_i64("correct_answers", row.try_get("correct_answers").map_err(ser)?)?,
        u32_from_i64("incorrect_answers", row.try_get("incorrect_answers").map_err(ser)?)?,
        row.try_get("score_percentage").map_err(ser)?,
        row.try_get("passed").map_err(ser)?,
        row.try_get("forced_retake").map_err(ser)?,
    )
    .map_err(ser)?;

    let attempt = QuizAttempt::new(
        set_id,
        user_id,
        answers,
        result,
        row.try_get("completed_at").map_err(ser)?,
    );
    Ok(AttemptRow::new(id, attempt))
}
