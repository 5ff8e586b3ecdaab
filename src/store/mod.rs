// src/store/mod.rs

//! Collaborators the exam core reads from and writes to.
//!
//! The core only depends on these traits. PostgreSQL implementations back the
//! running server; in-memory implementations back tests and local demos.

pub mod memory;
pub mod postgres;
pub mod schema;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::Attempt,
        exam_result::{AnswerAudit, ExamResult, NewExamResult},
        question::{OptionRecord, QuestionKind, QuestionRecord},
    },
};

pub use memory::{MemoryAttemptStore, MemoryQuestion, MemoryQuestionBank, MemoryResultLedger};
pub use postgres::{PgQuestionBank, PgResultLedger};
pub use schema::FieldMap;

/// Read-only access to the question bank.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Draws up to `count` active questions of `kind` in random order,
    /// skipping any id listed in `exclude`.
    async fn sample(
        &self,
        kind: QuestionKind,
        count: usize,
        category: Option<&str>,
        exclude: &[i64],
    ) -> Result<Vec<QuestionRecord>, AppError>;

    /// `None` when the id is unknown or its stored kind is not recognised.
    async fn question_kind(&self, question_id: i64) -> Result<Option<QuestionKind>, AppError>;

    async fn options(&self, question_id: i64) -> Result<Vec<OptionRecord>, AppError>;

    /// Raw stored index collection of an mcq question.
    async fn mcq_answer_indices(&self, question_id: i64) -> Result<Option<String>, AppError>;

    /// Canonical answer text of a voice question.
    async fn voice_answer_text(&self, question_id: i64) -> Result<Option<String>, AppError>;
}

/// Keyed storage for in-flight attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn create(&self, attempt: Attempt) -> Result<(), AppError>;
    async fn get(&self, token: &str) -> Result<Option<Attempt>, AppError>;
    async fn delete(&self, token: &str) -> Result<(), AppError>;
}

/// Durable storage of finalized results and the per-answer audit trail.
#[async_trait]
pub trait ResultLedger: Send + Sync {
    async fn insert_result(&self, result: &NewExamResult) -> Result<i64, AppError>;
    async fn record_answers(&self, entries: &[AnswerAudit]) -> Result<(), AppError>;
    async fn results_for_student(
        &self,
        student_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamResult>, AppError>;
    async fn all_results_for_student(&self, student_id: &str) -> Result<Vec<ExamResult>, AppError>;
}
