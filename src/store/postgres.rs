// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::AppError,
    models::{
        exam_result::{AnswerAudit, ExamResult, ExamResultRow, NewExamResult},
        question::{OptionRecord, QuestionKind, QuestionRecord},
    },
    store::{
        QuestionBank, ResultLedger,
        schema::{FieldMap, quote},
    },
};

/// Helper struct for reading question rows under their logical names.
#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    question_type: Option<String>,
    question_text: Option<String>,
    question_format: Option<String>,
    question_image: Option<String>,
    answer_type: Option<String>,
    audio_link: Option<String>,
    difficulty: Option<String>,
    category: Option<String>,
    time_limit: Option<i32>,
}

impl QuestionRow {
    fn into_record(self) -> Option<QuestionRecord> {
        let Some(kind) = self.question_type.as_deref().and_then(QuestionKind::parse) else {
            tracing::warn!(
                "Skipping question {} with unknown type {:?}",
                self.id,
                self.question_type
            );
            return None;
        };

        Some(QuestionRecord {
            id: self.id,
            kind,
            text: self.question_text,
            format: self.question_format,
            image: self.question_image,
            answer_type: self.answer_type,
            audio: self.audio_link,
            difficulty: self.difficulty,
            category: self.category,
            time_limit: self.time_limit,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    option_order: i32,
    option_text: Option<String>,
    option_image: Option<String>,
}

/// Renders `"column"::TYPE AS alias`, or a typed NULL when the column is absent.
fn column(field: Option<&str>, sql_type: &str, alias: &str) -> String {
    match field {
        Some(name) => format!("{}::{} AS {}", quote(name), sql_type, alias),
        None => format!("NULL::{} AS {}", sql_type, alias),
    }
}

/// Question bank backed by the `questions` family of tables.
pub struct PgQuestionBank {
    pool: PgPool,
    fields: FieldMap,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool, fields: FieldMap) -> Self {
        Self { pool, fields }
    }

    fn question_columns(&self) -> String {
        let f = &self.fields;
        [
            column(f.question_type, "TEXT", "question_type"),
            column(f.text, "TEXT", "question_text"),
            column(f.format, "TEXT", "question_format"),
            column(f.image, "TEXT", "question_image"),
            column(f.answer_type, "TEXT", "answer_type"),
            column(f.audio, "TEXT", "audio_link"),
            column(f.difficulty, "TEXT", "difficulty"),
            column(f.category, "TEXT", "category"),
            column(f.time_limit, "INTEGER", "time_limit"),
        ]
        .join(", ")
    }

    fn option_order_expr(&self) -> String {
        match self.fields.option_order {
            Some(name) => format!("{}::INTEGER", quote(name)),
            // No stored order: fall back to insertion order.
            None => "(ROW_NUMBER() OVER (ORDER BY id) - 1)::INTEGER".to_string(),
        }
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn sample(
        &self,
        kind: QuestionKind,
        count: usize,
        category: Option<&str>,
        exclude: &[i64],
    ) -> Result<Vec<QuestionRecord>, AppError> {
        let Some(type_column) = self.fields.question_type else {
            tracing::warn!("Question bank has no type column, nothing can be sampled");
            return Ok(Vec::new());
        };
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut query_builder = QueryBuilder::<Postgres>::new("SELECT id::BIGINT AS id, ");
        query_builder.push(self.question_columns());
        query_builder.push(" FROM questions WHERE ");
        query_builder.push(quote(type_column));
        query_builder.push("::TEXT = ");
        query_builder.push_bind(kind.as_str());

        if let Some(active) = self.fields.active {
            query_builder.push(format!(" AND {}::BOOLEAN", quote(active)));
        }

        if let Some(category) = category {
            match self.fields.category {
                Some(category_column) => {
                    query_builder.push(format!(" AND {}::TEXT = ", quote(category_column)));
                    query_builder.push_bind(category.to_string());
                }
                None => tracing::warn!(
                    "Ignoring category filter {:?}: bank has no category column",
                    category
                ),
            }
        }

        if !exclude.is_empty() {
            query_builder.push(" AND id <> ALL(");
            query_builder.push_bind(exclude.to_vec());
            query_builder.push(")");
        }

        query_builder.push(" ORDER BY RANDOM() LIMIT ");
        query_builder.push_bind(count as i64);

        let rows: Vec<QuestionRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sample {} questions: {:?}", kind.as_str(), e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(rows.into_iter().filter_map(QuestionRow::into_record).collect())
    }

    async fn question_kind(&self, question_id: i64) -> Result<Option<QuestionKind>, AppError> {
        let Some(type_column) = self.fields.question_type else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {}::TEXT FROM questions WHERE id = $1",
            quote(type_column)
        );
        let row: Option<(Option<String>,)> = sqlx::query_as(&sql)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row
            .and_then(|(kind,)| kind)
            .and_then(|kind| QuestionKind::parse(&kind)))
    }

    async fn options(&self, question_id: i64) -> Result<Vec<OptionRecord>, AppError> {
        let sql = format!(
            "SELECT * FROM (SELECT {} AS option_order, {}, {} FROM question_options WHERE question_id = $1) AS o ORDER BY option_order ASC",
            self.option_order_expr(),
            column(self.fields.option_text, "TEXT", "option_text"),
            column(self.fields.option_image, "TEXT", "option_image"),
        );

        let rows: Vec<OptionRow> = sqlx::query_as(&sql)
            .bind(question_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| OptionRecord {
                order_index: row.option_order,
                text: row.option_text,
                image: row.option_image,
            })
            .collect())
    }

    async fn mcq_answer_indices(&self, question_id: i64) -> Result<Option<String>, AppError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT answer_indices::TEXT FROM mcq_question_answers WHERE question_id = $1 LIMIT 1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(indices,)| indices))
    }

    async fn voice_answer_text(&self, question_id: i64) -> Result<Option<String>, AppError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT answer_text::TEXT FROM voice_question_answers WHERE question_id = $1 LIMIT 1",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(text,)| text))
    }
}

/// Result ledger backed by `exam_results` and `user_answers`.
pub struct PgResultLedger {
    pool: PgPool,
}

impl PgResultLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const RESULT_COLUMNS: &str = "id, exam_id, student_id, score, total_marks, percentage, time_taken, status, started_at, submitted_at";

#[async_trait]
impl ResultLedger for PgResultLedger {
    async fn insert_result(&self, result: &NewExamResult) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO exam_results
                (exam_id, student_id, score, total_marks, percentage, time_taken, status, started_at, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(result.exam_id)
        .bind(&result.student_id)
        .bind(result.score)
        .bind(result.total_marks)
        .bind(result.percentage)
        .bind(result.time_taken)
        .bind(result.status.as_str())
        .bind(result.started_at)
        .bind(result.submitted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn record_answers(&self, entries: &[AnswerAudit]) -> Result<(), AppError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut query_builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO user_answers (attempt_token, user_id, exam_type, question_id, selected_index, selected_text, is_correct) ",
        );
        query_builder.push_values(entries, |mut row, entry| {
            row.push_bind(entry.attempt_token.clone())
                .push_bind(entry.user_id.clone())
                .push_bind(entry.exam_kind.as_str())
                .push_bind(entry.question_id)
                .push_bind(entry.selected_index)
                .push_bind(entry.selected_text.clone())
                .push_bind(entry.is_correct);
        });

        query_builder.build().execute(&self.pool).await?;

        Ok(())
    }

    async fn results_for_student(
        &self,
        student_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM exam_results WHERE student_id = $1 ORDER BY submitted_at DESC LIMIT $2 OFFSET $3",
            RESULT_COLUMNS
        );
        let rows: Vec<ExamResultRow> = sqlx::query_as(&sql)
            .bind(student_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch exam results: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Ok(rows.into_iter().map(ExamResult::from).collect())
    }

    async fn all_results_for_student(&self, student_id: &str) -> Result<Vec<ExamResult>, AppError> {
        let sql = format!(
            "SELECT {} FROM exam_results WHERE student_id = $1 ORDER BY submitted_at DESC",
            RESULT_COLUMNS
        );
        let rows: Vec<ExamResultRow> = sqlx::query_as(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ExamResult::from).collect())
    }
}
