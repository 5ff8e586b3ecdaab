// src/models/attempt.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::ExamKind;

/// Server-side binding between an attempt token and the questions it offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub token: String,
    pub kind: ExamKind,
    pub category: Option<String>,
    pub question_ids: Vec<i64>,
    pub started_at: DateTime<Utc>,
    /// Subject of the identity that started the attempt; `None` for anonymous callers.
    pub owner: Option<String>,
}

impl Attempt {
    /// Whether the question was part of this attempt.
    pub fn offers(&self, question_id: i64) -> bool {
        self.question_ids.contains(&question_id)
    }

    pub fn is_owned_by(&self, subject: Option<&str>) -> bool {
        self.owner.as_deref() == subject
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.started_at > ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(owner: Option<&str>) -> Attempt {
        Attempt {
            token: "t".to_string(),
            kind: ExamKind::Both,
            category: None,
            question_ids: vec![4, 9],
            started_at: Utc::now(),
            owner: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_offers_only_sampled_ids() {
        let attempt = attempt(None);
        assert!(attempt.offers(9));
        assert!(!attempt.offers(5));
    }

    #[test]
    fn test_ownership_distinguishes_anonymous() {
        assert!(attempt(None).is_owned_by(None));
        assert!(!attempt(None).is_owned_by(Some("12")));
        assert!(attempt(Some("12")).is_owned_by(Some("12")));
        assert!(!attempt(Some("12")).is_owned_by(None));
    }

    #[test]
    fn test_expiry() {
        let attempt = attempt(None);
        let ttl = Duration::seconds(60);
        assert!(!attempt.is_expired(attempt.started_at + Duration::seconds(59), ttl));
        assert!(attempt.is_expired(attempt.started_at + Duration::seconds(61), ttl));
    }
}
