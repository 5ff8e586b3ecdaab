// src/store/memory.rs

use std::{
    collections::HashMap,
    sync::{Mutex, RwLock},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;

use crate::{
    error::AppError,
    models::{
        attempt::Attempt,
        exam_result::{AnswerAudit, ExamResult, NewExamResult},
        question::{OptionRecord, QuestionKind, QuestionRecord},
    },
    store::{AttemptStore, QuestionBank, ResultLedger},
};

fn poisoned<T>(_: T) -> AppError {
    AppError::InternalServerError("in-memory store lock poisoned".to_string())
}

/// A bank entry together with its options and answer key.
#[derive(Debug, Clone)]
pub struct MemoryQuestion {
    pub record: QuestionRecord,
    pub active: bool,
    pub options: Vec<OptionRecord>,
    pub mcq_answer_indices: Option<String>,
    pub voice_answer_text: Option<String>,
}

impl MemoryQuestion {
    fn base(id: i64, kind: QuestionKind, text: &str, options: &[&str]) -> Self {
        Self {
            record: QuestionRecord {
                id,
                kind,
                text: Some(text.to_string()),
                format: Some("text".to_string()),
                image: None,
                answer_type: Some("single".to_string()),
                audio: None,
                difficulty: None,
                category: None,
                time_limit: None,
            },
            active: true,
            options: options
                .iter()
                .enumerate()
                .map(|(index, option)| OptionRecord {
                    order_index: index as i32,
                    text: Some(option.to_string()),
                    image: None,
                })
                .collect(),
            mcq_answer_indices: None,
            voice_answer_text: None,
        }
    }

    /// `answer_indices` is the stored JSON document, e.g. `"[1,3]"`.
    pub fn mcq(id: i64, text: &str, options: &[&str], answer_indices: &str) -> Self {
        let mut question = Self::base(id, QuestionKind::Mcq, text, options);
        question.mcq_answer_indices = Some(answer_indices.to_string());
        question
    }

    pub fn voice(id: i64, text: &str, options: &[&str], answer_text: &str) -> Self {
        let mut question = Self::base(id, QuestionKind::Voice, text, options);
        question.voice_answer_text = Some(answer_text.to_string());
        question
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.record.category = Some(category.to_string());
        self
    }

    pub fn with_answer_type(mut self, answer_type: &str) -> Self {
        self.record.answer_type = Some(answer_type.to_string());
        self
    }

    pub fn with_time_limit(mut self, seconds: i32) -> Self {
        self.record.time_limit = Some(seconds);
        self
    }

    pub fn without_answer(mut self) -> Self {
        self.mcq_answer_indices = None;
        self.voice_answer_text = None;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Question bank held in process memory. Read-only once built.
#[derive(Debug, Default)]
pub struct MemoryQuestionBank {
    questions: HashMap<i64, MemoryQuestion>,
}

impl MemoryQuestionBank {
    pub fn new(questions: impl IntoIterator<Item = MemoryQuestion>) -> Self {
        Self {
            questions: questions
                .into_iter()
                .map(|question| (question.record.id, question))
                .collect(),
        }
    }
}

#[async_trait]
impl QuestionBank for MemoryQuestionBank {
    async fn sample(
        &self,
        kind: QuestionKind,
        count: usize,
        category: Option<&str>,
        exclude: &[i64],
    ) -> Result<Vec<QuestionRecord>, AppError> {
        let mut candidates: Vec<QuestionRecord> = self
            .questions
            .values()
            .filter(|q| q.active && q.record.kind == kind)
            .filter(|q| category.is_none_or(|c| q.record.category.as_deref() == Some(c)))
            .filter(|q| !exclude.contains(&q.record.id))
            .map(|q| q.record.clone())
            .collect();

        candidates.shuffle(&mut rand::thread_rng());
        candidates.truncate(count);

        Ok(candidates)
    }

    async fn question_kind(&self, question_id: i64) -> Result<Option<QuestionKind>, AppError> {
        Ok(self.questions.get(&question_id).map(|q| q.record.kind))
    }

    async fn options(&self, question_id: i64) -> Result<Vec<OptionRecord>, AppError> {
        let mut options = self
            .questions
            .get(&question_id)
            .map(|q| q.options.clone())
            .unwrap_or_default();
        options.sort_by_key(|o| o.order_index);
        Ok(options)
    }

    async fn mcq_answer_indices(&self, question_id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .questions
            .get(&question_id)
            .and_then(|q| q.mcq_answer_indices.clone()))
    }

    async fn voice_answer_text(&self, question_id: i64) -> Result<Option<String>, AppError> {
        Ok(self
            .questions
            .get(&question_id)
            .and_then(|q| q.voice_answer_text.clone()))
    }
}

/// Process-local attempt store. Attempts older than the TTL read as absent
/// and are purged on access.
#[derive(Debug)]
pub struct MemoryAttemptStore {
    attempts: RwLock<HashMap<String, Attempt>>,
    ttl: Duration,
}

impl MemoryAttemptStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.attempts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn create(&self, attempt: Attempt) -> Result<(), AppError> {
        let now = Utc::now();
        let mut attempts = self.attempts.write().map_err(poisoned)?;
        attempts.retain(|_, a| !a.is_expired(now, self.ttl));
        attempts.insert(attempt.token.clone(), attempt);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Attempt>, AppError> {
        let now = Utc::now();
        let attempt = self
            .attempts
            .read()
            .map_err(poisoned)?
            .get(token)
            .cloned();

        match attempt {
            Some(attempt) if attempt.is_expired(now, self.ttl) => {
                tracing::debug!("Attempt expired, purging it");
                self.attempts.write().map_err(poisoned)?.remove(token);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        self.attempts.write().map_err(poisoned)?.remove(token);
        Ok(())
    }
}

/// Result ledger held in process memory.
#[derive(Debug, Default)]
pub struct MemoryResultLedger {
    results: Mutex<Vec<ExamResult>>,
    answers: Mutex<Vec<AnswerAudit>>,
}

impl MemoryResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<ExamResult> {
        self.results.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn audit_trail(&self) -> Vec<AnswerAudit> {
        self.answers.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResultLedger for MemoryResultLedger {
    async fn insert_result(&self, result: &NewExamResult) -> Result<i64, AppError> {
        let mut results = self.results.lock().map_err(poisoned)?;
        let id = results.len() as i64 + 1;
        results.push(ExamResult {
            id,
            exam_id: result.exam_id,
            student_id: result.student_id.clone(),
            score: result.score,
            total_marks: result.total_marks,
            percentage: result.percentage,
            time_taken: result.time_taken,
            status: result.status,
            started_at: result.started_at,
            submitted_at: result.submitted_at,
        });
        Ok(id)
    }

    async fn record_answers(&self, entries: &[AnswerAudit]) -> Result<(), AppError> {
        self.answers
            .lock()
            .map_err(poisoned)?
            .extend_from_slice(entries);
        Ok(())
    }

    async fn results_for_student(
        &self,
        student_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamResult>, AppError> {
        let mut results = self.all_results_for_student(student_id).await?;
        let offset = offset.max(0) as usize;
        let limit = limit.max(0) as usize;
        results = results.into_iter().skip(offset).take(limit).collect();
        Ok(results)
    }

    async fn all_results_for_student(&self, student_id: &str) -> Result<Vec<ExamResult>, AppError> {
        let mut results: Vec<ExamResult> = self
            .results
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        // Newest first, ties broken by insertion order.
        results.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        Ok(results)
    }
}
