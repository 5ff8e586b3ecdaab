// src/exam/mod.rs

//! Exam-attempt core: sampling, attempt binding, grading and result emission.
//!
//! `ExamService` is what the HTTP layer talks to. Storage is reached only
//! through the `store` traits, so the same service runs against PostgreSQL
//! in production and in-memory collaborators in tests.

pub mod attempts;
pub mod grader;
pub mod resolver;
pub mod results;
pub mod sampler;

use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::MAX_RESULTS_LIMIT,
    error::AppError,
    models::{
        exam::{
            ExamRequest, FetchQuestionsResponse, StartExamResponse, SubmitAnswersRequest,
            SubmitAnswersResponse,
        },
        exam_result::{ResultStatistics, ResultsPage},
    },
    store::{AttemptStore, QuestionBank, ResultLedger},
    utils::jwt::Identity,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExamSettings {
    /// Remove the attempt after its first graded submission.
    pub single_use_attempts: bool,
}

pub struct ExamService {
    bank: Arc<dyn QuestionBank>,
    attempts: Arc<dyn AttemptStore>,
    ledger: Arc<dyn ResultLedger>,
    settings: ExamSettings,
}

impl ExamService {
    pub fn new(
        bank: Arc<dyn QuestionBank>,
        attempts: Arc<dyn AttemptStore>,
        ledger: Arc<dyn ResultLedger>,
        settings: ExamSettings,
    ) -> Self {
        Self {
            bank,
            attempts,
            ledger,
            settings,
        }
    }

    /// Samples questions and opens an attempt bound to the caller.
    pub async fn start_exam(
        &self,
        request: ExamRequest,
        caller: Option<&Identity>,
    ) -> Result<StartExamResponse, AppError> {
        let params = request.params()?;
        let questions =
            sampler::sample(self.bank.as_ref(), params.kind, params.count, params.category.as_deref())
                .await?;

        let attempt = attempts::open_attempt(&params, &questions, caller, Utc::now());
        let attempt_token = attempt.token.clone();
        self.attempts.create(attempt).await?;

        tracing::info!(
            "Started {} exam with {} of {} requested questions",
            params.kind.as_str(),
            questions.len(),
            params.count
        );

        Ok(StartExamResponse {
            attempt_token,
            kind: params.kind,
            count: questions.len(),
            questions,
        })
    }

    /// Same sampling as `start_exam`, without opening an attempt.
    pub async fn fetch_questions(
        &self,
        request: ExamRequest,
    ) -> Result<FetchQuestionsResponse, AppError> {
        let params = request.params()?;
        let questions =
            sampler::sample(self.bank.as_ref(), params.kind, params.count, params.category.as_deref())
                .await?;

        Ok(FetchQuestionsResponse { questions })
    }

    /// Grades a submission against its attempt and emits the result.
    pub async fn submit_answers(
        &self,
        request: SubmitAnswersRequest,
        caller: Option<&Identity>,
    ) -> Result<SubmitAnswersResponse, AppError> {
        let (Some(token), Some(answers)) = (request.attempt_token, request.answers) else {
            return Err(AppError::BadRequest(
                "attemptToken and answers are required".to_string(),
            ));
        };

        let attempt = attempts::find_live_attempt(self.attempts.as_ref(), &token, caller).await?;

        let keys = grader::load_answer_keys(self.bank.as_ref(), &attempt, &answers).await?;
        let grading = grader::grade(&attempt, &answers, &keys);

        results::record_audit_trail(self.ledger.as_ref(), &attempt, caller, &grading).await;
        let result_id = results::maybe_persist_result(
            self.ledger.as_ref(),
            &attempt,
            &grading.summary,
            caller,
            Utc::now(),
        )
        .await;

        if self.settings.single_use_attempts {
            self.attempts.delete(&attempt.token).await?;
        }

        tracing::info!(
            "Graded attempt: {}/{} correct ({}%)",
            grading.summary.correct,
            grading.summary.total,
            grading.summary.percentage
        );

        Ok(SubmitAnswersResponse {
            attempt_token: attempt.token,
            result_id,
            details: grading.details(),
            summary: grading.summary,
        })
    }

    /// A page of the student's ledger entries, newest first.
    pub async fn student_results(
        &self,
        student: &Identity,
        limit: i64,
        offset: i64,
    ) -> Result<ResultsPage, AppError> {
        let limit = limit.clamp(1, MAX_RESULTS_LIMIT);
        let offset = offset.max(0);

        let results = self
            .ledger
            .results_for_student(&student.subject, limit, offset)
            .await?;

        Ok(ResultsPage {
            count: results.len(),
            results,
        })
    }

    pub async fn student_statistics(&self, student: &Identity) -> Result<ResultStatistics, AppError> {
        let results = self.ledger.all_results_for_student(&student.subject).await?;
        Ok(ResultStatistics::from_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::{
        models::exam_result::{AnswerAudit, ExamResult, NewExamResult},
        store::{MemoryAttemptStore, MemoryQuestion, MemoryQuestionBank, MemoryResultLedger},
    };

    /// Remembers the paging arguments it was asked for.
    #[derive(Default)]
    struct PagingLedger {
        requested: Mutex<Vec<(i64, i64)>>,
    }

    #[async_trait]
    impl ResultLedger for PagingLedger {
        async fn insert_result(&self, _: &NewExamResult) -> Result<i64, AppError> {
            Ok(1)
        }
        async fn record_answers(&self, _: &[AnswerAudit]) -> Result<(), AppError> {
            Ok(())
        }
        async fn results_for_student(
            &self,
            _: &str,
            limit: i64,
            offset: i64,
        ) -> Result<Vec<ExamResult>, AppError> {
            self.requested.lock().unwrap().push((limit, offset));
            Ok(Vec::new())
        }
        async fn all_results_for_student(&self, _: &str) -> Result<Vec<ExamResult>, AppError> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        service: ExamService,
        attempts: Arc<MemoryAttemptStore>,
        ledger: Arc<MemoryResultLedger>,
    }

    fn fixture(single_use: bool) -> Fixture {
        let bank = Arc::new(MemoryQuestionBank::new([
            MemoryQuestion::mcq(1, "2 + 2", &["3", "4", "5"], "[1]"),
            MemoryQuestion::mcq(2, "Primes", &["2", "4", "5"], "[0,2]"),
            MemoryQuestion::voice(3, "Say hello", &["hello", "bye"], "hello"),
        ]));
        let attempts = Arc::new(MemoryAttemptStore::new(Duration::hours(1)));
        let ledger = Arc::new(MemoryResultLedger::new());
        let service = ExamService::new(
            bank,
            attempts.clone(),
            ledger.clone(),
            ExamSettings {
                single_use_attempts: single_use,
            },
        );
        Fixture {
            service,
            attempts,
            ledger,
        }
    }

    fn student() -> Identity {
        Identity {
            subject: "7".to_string(),
            role: "student".to_string(),
        }
    }

    fn submission(token: &str, pairs: &[(i64, i64)]) -> SubmitAnswersRequest {
        serde_json::from_value(serde_json::json!({
            "attemptToken": token,
            "answers": pairs
                .iter()
                .map(|(q, s)| serde_json::json!({"questionId": q, "selectedIndex": s}))
                .collect::<Vec<_>>(),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_submit() {
        let f = fixture(false);
        let me = student();
        let started = f
            .service
            .start_exam(
                ExamRequest {
                    kind: Some("mcq".to_string()),
                    count: Some(5),
                    category: None,
                },
                Some(&me),
            )
            .await
            .unwrap();
        assert_eq!(started.count, 2);
        assert_eq!(f.attempts.len(), 1);

        let graded = f
            .service
            .submit_answers(submission(&started.attempt_token, &[(1, 1), (2, 1), (3, 0)]), Some(&me))
            .await
            .unwrap();

        assert_eq!(graded.summary.total, 2);
        assert_eq!(graded.summary.correct, 1);
        assert_eq!(graded.summary.percentage, 50);
        assert_eq!(graded.result_id, Some(1));
        assert_eq!(f.ledger.audit_trail().len(), 2);
        assert_eq!(f.attempts.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_requests() {
        let f = fixture(false);
        let result = f
            .service
            .submit_answers(SubmitAnswersRequest::default(), None)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_single_use_attempts_are_dropped() {
        let f = fixture(true);
        let started = f
            .service
            .start_exam(ExamRequest::default(), None)
            .await
            .unwrap();

        let first = f
            .service
            .submit_answers(submission(&started.attempt_token, &[(3, 0)]), None)
            .await
            .unwrap();
        assert_eq!(first.result_id, None);
        assert!(f.attempts.is_empty());

        let again = f
            .service
            .submit_answers(submission(&started.attempt_token, &[(3, 0)]), None)
            .await;
        assert!(matches!(again, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_statistics_follow_saved_results() {
        let f = fixture(false);
        let me = student();

        let empty = f.service.student_statistics(&me).await.unwrap();
        assert_eq!(empty.total_exams, 0);

        let started = f
            .service
            .start_exam(ExamRequest::default(), Some(&me))
            .await
            .unwrap();
        f.service
            .submit_answers(submission(&started.attempt_token, &[(1, 1)]), Some(&me))
            .await
            .unwrap();

        let page = f.service.student_results(&me, 0, -5).await.unwrap();
        assert_eq!(page.count, 1);

        let stats = f.service.student_statistics(&me).await.unwrap();
        assert_eq!(stats.total_exams, 1);
    }

    #[tokio::test]
    async fn test_results_paging_is_clamped() {
        let ledger = Arc::new(PagingLedger::default());
        let service = ExamService::new(
            Arc::new(MemoryQuestionBank::new(Vec::new())),
            Arc::new(MemoryAttemptStore::new(Duration::hours(1))),
            ledger.clone(),
            ExamSettings::default(),
        );
        let me = student();

        service.student_results(&me, 5000, 3).await.unwrap();
        service.student_results(&me, 0, -1).await.unwrap();
        service.student_results(&me, 25, 0).await.unwrap();

        assert_eq!(
            *ledger.requested.lock().unwrap(),
            vec![(MAX_RESULTS_LIMIT, 3), (1, 0), (25, 0)]
        );
    }
}
