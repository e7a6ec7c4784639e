use quiz_core::model::{QuestionSetId, QuizAttempt, UserId};

use super::SqliteRepository;
use super::mapping::{conn, encode_answers, id_i64, map_attempt_row};
use crate::repository::{AttemptId, AttemptLog, AttemptRow, AttemptSink, StorageError};

#[async_trait::async_trait]
impl AttemptSink for SqliteRepository {
    async fn record_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let set_id = id_i64("set_id", attempt.set_id.value())?;
        let answers = encode_answers(&attempt.answers)?;
        let result = &attempt.result;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    set_id, user_id, answers, total_questions, correct_answers,
                    incorrect_answers, score_percentage, passed, forced_retake, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(set_id)
        .bind(attempt.user_id.map(|u| u.to_string()))
        .bind(answers)
        .bind(i64::from(result.total_questions()))
        .bind(i64::from(result.correct_answers()))
        .bind(i64::from(result.incorrect_answers()))
        .bind(result.score_percentage())
        .bind(result.passed())
        .bind(result.forced_retake())
        .bind(attempt.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }
}

#[async_trait::async_trait]
impl AttemptLog for SqliteRepository {
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, set_id, user_id, answers, total_questions, correct_answers,
                    incorrect_answers, score_percentage, passed, forced_retake, completed_at
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        Ok(map_attempt_row(&row)?.attempt)
    }

    async fn list_attempts(
        &self,
        set_id: QuestionSetId,
        user_id: Option<UserId>,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT
                    id, set_id, user_id, answers, total_questions, correct_answers,
                    incorrect_answers, score_percentage, passed, forced_retake, completed_at
                FROM quiz_attempts
                WHERE set_id = ?1
            ",
        );

        let mut bind_index = 2;
        if user_id.is_some() {
            sql.push_str(" AND user_id = ?");
            sql.push_str(&bind_index.to_string());
            bind_index += 1;
        }
        sql.push_str(" ORDER BY completed_at DESC, id DESC");
        sql.push_str(" LIMIT ?");
        sql.push_str(&bind_index.to_string());

        let mut query = sqlx::query(&sql).bind(id_i64("set_id", set_id.value())?);
        if let Some(user) = user_id {
            query = query.bind(user.to_string());
        }
        query = query.bind(i64::from(limit));

        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
