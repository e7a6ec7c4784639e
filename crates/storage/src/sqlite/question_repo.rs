use std::collections::HashMap;

use chrono::Utc;
use quiz_core::model::{QuestionSet, QuestionSetId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, ser, u64_from_i64};
use crate::repository::{
    OptionRecord, QuestionRecord, QuestionSetRecord, QuestionSetRepository, QuestionSetSummary,
    QuestionSource, StorageError,
};

impl SqliteRepository {
    /// Load the raw records for a set without validating them.
    async fn load_record(&self, id: QuestionSetId) -> Result<QuestionSetRecord, StorageError> {
        let set_id = id_i64("set_id", id.value())?;

        let set_row = sqlx::query(
            r"
                SELECT title, description
                FROM question_sets
                WHERE id = ?1
            ",
        )
        .bind(set_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let question_rows = sqlx::query(
            r"
                SELECT id, prompt, correct_option_id, explanation
                FROM questions
                WHERE set_id = ?1
                ORDER BY position ASC, id ASC
            ",
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let option_rows = sqlx::query(
            r"
                SELECT question_id, option_id, label, text
                FROM question_options
                WHERE set_id = ?1
                ORDER BY question_id ASC, position ASC, option_id ASC
            ",
        )
        .bind(set_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut options: HashMap<u64, Vec<OptionRecord>> = HashMap::new();
        for row in option_rows {
            let question_id = u64_from_i64("question_id", row.try_get("question_id").map_err(ser)?)?;
            options.entry(question_id).or_default().push(OptionRecord {
                id: Some(u64_from_i64("option_id", row.try_get("option_id").map_err(ser)?)?),
                label: row.try_get("label").map_err(ser)?,
                text: row.try_get("text").map_err(ser)?,
            });
        }

        let mut questions = Vec::with_capacity(question_rows.len());
        for row in question_rows {
            let id = u64_from_i64("question_id", row.try_get("id").map_err(ser)?)?;
            let correct_option_id = row
                .try_get::<Option<i64>, _>("correct_option_id")
                .map_err(ser)?
                .map(|v| u64_from_i64("correct_option_id", v))
                .transpose()?;
            questions.push(QuestionRecord {
                id: Some(id),
                prompt: row.try_get("prompt").map_err(ser)?,
                options: options.remove(&id).unwrap_or_default(),
                correct_option_id,
                explanation: row.try_get("explanation").map_err(ser)?,
            });
        }

        Ok(QuestionSetRecord {
            id: id.value(),
            title: set_row.try_get("title").map_err(ser)?,
            description: set_row.try_get("description").map_err(ser)?,
            questions,
        })
    }
}

#[async_trait::async_trait]
impl QuestionSource for SqliteRepository {
    async fn fetch_question_set(&self, id: QuestionSetId) -> Result<QuestionSet, StorageError> {
        self.load_record(id).await?.into_question_set()
    }
}

#[async_trait::async_trait]
impl QuestionSetRepository for SqliteRepository {
    async fn upsert_question_set(
        &self,
        record: &QuestionSetRecord,
    ) -> Result<QuestionSetId, StorageError> {
        let set = record.clone().into_question_set()?;
        let set_id = id_i64("set_id", set.id().value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO question_sets (id, title, description, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    description = excluded.description,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(set_id)
        .bind(&set.meta().title)
        .bind(set.meta().description.as_deref())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Options cascade from questions.
        sqlx::query("DELETE FROM questions WHERE set_id = ?1")
            .bind(set_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, question) in set.questions().iter().enumerate() {
            let question_id = id_i64("question_id", question.id().value())?;
            sqlx::query(
                r"
                    INSERT INTO questions (
                        id, set_id, position, prompt, correct_option_id, explanation
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(question_id)
            .bind(set_id)
            .bind(i64::try_from(position).map_err(ser)?)
            .bind(question.prompt())
            .bind(id_i64("correct_option_id", question.correct_option().value())?)
            .bind(question.explanation())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

            for (option_position, option) in question.options().iter().enumerate() {
                sqlx::query(
                    r"
                        INSERT INTO question_options (
                            option_id, question_id, set_id, position, label, text
                        )
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ",
                )
                .bind(id_i64("option_id", option.id.value())?)
                .bind(question_id)
                .bind(set_id)
                .bind(i64::try_from(option_position).map_err(ser)?)
                .bind(&option.label)
                .bind(&option.text)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(set.id())
    }

    async fn list_question_sets(&self, limit: u32) -> Result<Vec<QuestionSetSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT s.id, s.title, COUNT(q.id) AS question_count
                FROM question_sets s
                LEFT JOIN questions q ON q.set_id = s.id
                GROUP BY s.id, s.title
                ORDER BY s.id ASC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id = u64_from_i64("set_id", row.try_get("id").map_err(ser)?)?;
            let count: i64 = row.try_get("question_count").map_err(ser)?;
            out.push(QuestionSetSummary {
                id: QuestionSetId::new(id),
                title: row
                    .try_get::<Option<String>, _>("title")
                    .map_err(ser)?
                    .unwrap_or_else(|| format!("Question set {id}")),
                question_count: u32::try_from(count).map_err(ser)?,
            });
        }
        Ok(out)
    }
}
