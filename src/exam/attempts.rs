// src/exam/attempts.rs

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{attempt::Attempt, exam::ExamParams, question::Question},
    store::AttemptStore,
    utils::{jwt::Identity, token::generate_attempt_token},
};

/// Binds a fresh token to the sampled questions.
pub fn open_attempt(
    params: &ExamParams,
    questions: &[Question],
    caller: Option<&Identity>,
    started_at: DateTime<Utc>,
) -> Attempt {
    Attempt {
        token: generate_attempt_token(),
        kind: params.kind,
        category: params.category.clone(),
        question_ids: questions.iter().map(|q| q.id).collect(),
        started_at,
        owner: caller.map(|identity| identity.subject.clone()),
    }
}

/// Looks up a live attempt owned by the caller.
///
/// Unknown, expired and foreign tokens are indistinguishable to the caller.
pub async fn find_live_attempt(
    store: &dyn AttemptStore,
    token: &str,
    caller: Option<&Identity>,
) -> Result<Attempt, AppError> {
    let subject = caller.map(|identity| identity.subject.as_str());

    match store.get(token).await? {
        Some(attempt) if attempt.is_owned_by(subject) => Ok(attempt),
        Some(_) => {
            tracing::warn!("Attempt token presented by a different session");
            Err(expired())
        }
        None => Err(expired()),
    }
}

fn expired() -> AppError {
    AppError::AuthError("Invalid or expired attemptToken".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{
        models::question::{ExamKind, QuestionKind, QuestionRecord},
        store::MemoryAttemptStore,
    };

    fn params() -> ExamParams {
        ExamParams {
            kind: ExamKind::Mcq,
            count: 2,
            category: Some("math".to_string()),
        }
    }

    fn question(id: i64) -> Question {
        Question::new(
            QuestionRecord {
                id,
                kind: QuestionKind::Mcq,
                text: None,
                format: None,
                image: None,
                answer_type: None,
                audio: None,
                difficulty: None,
                category: None,
                time_limit: None,
            },
            Vec::new(),
        )
    }

    fn student(subject: &str) -> Identity {
        Identity {
            subject: subject.to_string(),
            role: "student".to_string(),
        }
    }

    #[test]
    fn test_open_attempt_records_sampled_ids() {
        let now = Utc::now();
        let owner = student("42");
        let attempt = open_attempt(&params(), &[question(3), question(8)], Some(&owner), now);

        assert_eq!(attempt.token.len(), 64);
        assert_eq!(attempt.question_ids, vec![3, 8]);
        assert_eq!(attempt.kind, ExamKind::Mcq);
        assert_eq!(attempt.category.as_deref(), Some("math"));
        assert_eq!(attempt.started_at, now);
        assert_eq!(attempt.owner.as_deref(), Some("42"));
    }

    #[test]
    fn test_tokens_are_unique() {
        let now = Utc::now();
        let a = open_attempt(&params(), &[], None, now);
        let b = open_attempt(&params(), &[], None, now);
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn test_find_live_attempt_checks_owner() {
        let store = MemoryAttemptStore::new(Duration::hours(1));
        let owner = student("42");
        let attempt = open_attempt(&params(), &[question(1)], Some(&owner), Utc::now());
        let token = attempt.token.clone();
        store.create(attempt).await.unwrap();

        assert!(find_live_attempt(&store, &token, Some(&owner)).await.is_ok());
        assert!(matches!(
            find_live_attempt(&store, &token, Some(&student("43"))).await,
            Err(AppError::AuthError(_))
        ));
        assert!(matches!(
            find_live_attempt(&store, &token, None).await,
            Err(AppError::AuthError(_))
        ));
        assert!(matches!(
            find_live_attempt(&store, "garbage", Some(&owner)).await,
            Err(AppError::AuthError(_))
        ));
    }
}
