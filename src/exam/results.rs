// src/exam/results.rs

use chrono::{DateTime, Utc};

use crate::{
    exam::grader::Grading,
    models::{
        attempt::Attempt,
        exam::Summary,
        exam_result::{AnswerAudit, NewExamResult},
    },
    store::ResultLedger,
    utils::jwt::Identity,
};

/// Hands the result to the ledger when the caller is a student.
///
/// Returns the ledger id, or `None` for anonymous and non-student callers.
/// A ledger failure is logged and also yields `None`; grading stands.
pub async fn maybe_persist_result(
    ledger: &dyn ResultLedger,
    attempt: &Attempt,
    summary: &Summary,
    caller: Option<&Identity>,
    submitted_at: DateTime<Utc>,
) -> Option<i64> {
    let student = caller.filter(|identity| identity.is_student())?;
    let record = NewExamResult::from_summary(student.subject.clone(), attempt, summary, submitted_at);

    match ledger.insert_result(&record).await {
        Ok(id) => {
            tracing::info!(
                "Saved exam result {} for student {} ({}/{})",
                id,
                student.subject,
                summary.correct,
                summary.total
            );
            Some(id)
        }
        Err(e) => {
            tracing::error!("Failed to save exam result for {}: {:?}", student.subject, e);
            None
        }
    }
}

/// Writes one audit row per graded pair. Failures are logged and swallowed.
pub async fn record_audit_trail(
    ledger: &dyn ResultLedger,
    attempt: &Attempt,
    caller: Option<&Identity>,
    grading: &Grading,
) {
    let entries: Vec<AnswerAudit> = grading
        .answers
        .iter()
        .map(|graded| AnswerAudit {
            attempt_token: attempt.token.clone(),
            user_id: caller.map(|identity| identity.subject.clone()),
            exam_kind: attempt.kind,
            question_id: graded.detail.question_id,
            selected_index: graded.detail.selected_index,
            selected_text: graded.selected_text.clone(),
            is_correct: graded.detail.is_correct,
        })
        .collect();

    if let Err(e) = ledger.record_answers(&entries).await {
        tracing::error!("Failed to record answer audit trail: {:?}", e);
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::{
        error::AppError,
        models::{exam_result::ExamResult, question::ExamKind},
        store::MemoryResultLedger,
    };

    struct BrokenLedger;

    #[async_trait]
    impl ResultLedger for BrokenLedger {
        async fn insert_result(&self, _: &NewExamResult) -> Result<i64, AppError> {
            Err(AppError::InternalServerError("disk full".to_string()))
        }
        async fn record_answers(&self, _: &[AnswerAudit]) -> Result<(), AppError> {
            Err(AppError::InternalServerError("disk full".to_string()))
        }
        async fn results_for_student(&self, _: &str, _: i64, _: i64) -> Result<Vec<ExamResult>, AppError> {
            Ok(Vec::new())
        }
        async fn all_results_for_student(&self, _: &str) -> Result<Vec<ExamResult>, AppError> {
            Ok(Vec::new())
        }
    }

    fn attempt() -> Attempt {
        Attempt {
            token: "tok".to_string(),
            kind: ExamKind::Voice,
            category: None,
            question_ids: vec![1, 2],
            started_at: Utc::now() - Duration::seconds(30),
            owner: Some("7".to_string()),
        }
    }

    fn identity(role: &str) -> Identity {
        Identity {
            subject: "7".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_student_result_is_persisted() {
        let ledger = MemoryResultLedger::new();
        let attempt = attempt();
        let summary = Summary::from_counts(2, 1);
        let now = attempt.started_at + Duration::seconds(30);

        let id = maybe_persist_result(&ledger, &attempt, &summary, Some(&identity("student")), now).await;

        assert_eq!(id, Some(1));
        let saved = ledger.results();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].student_id, "7");
        assert_eq!(saved[0].score, 1);
        assert_eq!(saved[0].total_marks, 2);
        assert_eq!(saved[0].percentage, 50.0);
        assert_eq!(saved[0].time_taken, 30);
    }

    #[tokio::test]
    async fn test_non_students_are_not_persisted() {
        let ledger = MemoryResultLedger::new();
        let summary = Summary::from_counts(1, 1);

        assert_eq!(
            maybe_persist_result(&ledger, &attempt(), &summary, None, Utc::now()).await,
            None
        );
        assert_eq!(
            maybe_persist_result(&ledger, &attempt(), &summary, Some(&identity("admin")), Utc::now()).await,
            None
        );
        assert!(ledger.results().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_failure_is_swallowed() {
        let summary = Summary::from_counts(1, 1);
        let id = maybe_persist_result(
            &BrokenLedger,
            &attempt(),
            &summary,
            Some(&identity("student")),
            Utc::now(),
        )
        .await;
        assert_eq!(id, None);

        let grading = Grading {
            summary,
            answers: Vec::new(),
        };
        record_audit_trail(&BrokenLedger, &attempt(), None, &grading).await;
    }
}
