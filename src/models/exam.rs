// src/models/exam.rs

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT},
    error::AppError,
    models::question::{ExamKind, Question, QuestionKind},
};

/// DTO for starting an exam or fetching a practice set.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamRequest {
    /// 'mcq', 'voice' or 'both'. Defaults to 'both'.
    #[serde(alias = "examType")]
    pub kind: Option<String>,

    /// Requested number of questions, clamped into [1, 200]. Defaults to 20.
    /// Numeric strings are accepted; anything else reads as absent.
    #[serde(alias = "numberOfQuestions", deserialize_with = "lenient_count")]
    pub count: Option<i64>,

    #[validate(length(max = 100))]
    pub category: Option<String>,
}

/// Validated sampling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamParams {
    pub kind: ExamKind,
    pub count: usize,
    pub category: Option<String>,
}

impl ExamRequest {
    pub fn params(&self) -> Result<ExamParams, AppError> {
        self.validate()?;

        let kind = ExamKind::from_input(self.kind.as_deref().unwrap_or("both"))?;
        let count = self
            .count
            .unwrap_or(DEFAULT_QUESTION_COUNT)
            .clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT) as usize;
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(ExamParams {
            kind,
            count,
            category,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExamResponse {
    pub attempt_token: String,
    pub kind: ExamKind,
    pub count: usize,
    pub questions: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct FetchQuestionsResponse {
    pub questions: Vec<Question>,
}

/// Integer value of a JSON number or numeric string.
pub fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int(&Value::deserialize(deserializer)?))
}

/// One (question, selection) pair of a submission.
///
/// Decoding never fails: a malformed element yields a pair without a
/// question id, which grading skips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: Option<i64>,
    pub selected_index: Option<i64>,
}

impl SubmittedAnswer {
    pub fn from_value(value: &Value) -> Self {
        let field = |camel: &str, snake: &str| {
            value
                .get(camel)
                .or_else(|| value.get(snake))
                .and_then(lenient_int)
        };

        Self {
            question_id: field("questionId", "question_id"),
            selected_index: field("selectedIndex", "selected_index"),
        }
    }
}

impl<'de> Deserialize<'de> for SubmittedAnswer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(&Value::deserialize(deserializer)?))
    }
}

/// DTO for submitting an attempt.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitAnswersRequest {
    /// The token received from start.
    pub attempt_token: Option<String>,
    pub answers: Option<Vec<SubmittedAnswer>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub percentage: u32,
}

impl Summary {
    pub fn from_counts(total: u32, correct: u32) -> Self {
        Self {
            total,
            correct,
            incorrect: total - correct,
            percentage: percentage(correct, total),
        }
    }
}

/// Rounded share of correct answers; zero when nothing was graded.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}

/// Per-question grading outcome, including the ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDetail {
    pub question_id: i64,
    pub kind: QuestionKind,
    pub selected_index: Option<i64>,
    pub is_correct: bool,
    pub correct_indices: Vec<i64>,
    pub correct_index: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswersResponse {
    pub attempt_token: String,
    pub result_id: Option<i64>,
    pub summary: Summary,
    pub details: Vec<GradeDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params = ExamRequest::default().params().unwrap();
        assert_eq!(params.kind, ExamKind::Both);
        assert_eq!(params.count, 20);
        assert_eq!(params.category, None);
    }

    #[test]
    fn test_params_clamps_count() {
        let low = ExamRequest {
            count: Some(0),
            ..Default::default()
        };
        let high = ExamRequest {
            count: Some(5000),
            ..Default::default()
        };
        assert_eq!(low.params().unwrap().count, 1);
        assert_eq!(high.params().unwrap().count, 200);
    }

    #[test]
    fn test_params_blank_category_is_no_filter() {
        let request = ExamRequest {
            kind: Some("voice".to_string()),
            category: Some("   ".to_string()),
            ..Default::default()
        };
        let params = request.params().unwrap();
        assert_eq!(params.kind, ExamKind::Voice);
        assert_eq!(params.category, None);
    }

    #[test]
    fn test_params_rejects_unknown_kind() {
        let request = ExamRequest {
            kind: Some("essay".to_string()),
            ..Default::default()
        };
        assert!(matches!(request.params(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(4, 4), 100);
    }

    #[test]
    fn test_submit_request_accepts_both_spellings() {
        let request: SubmitAnswersRequest = serde_json::from_str(
            r#"{"attemptToken":"abc","answers":[{"questionId":1,"selectedIndex":2},{"question_id":3}]}"#,
        )
        .unwrap();
        let answers = request.answers.unwrap();
        assert_eq!(answers[0].selected_index, Some(2));
        assert_eq!(answers[1].question_id, Some(3));
        assert_eq!(answers[1].selected_index, None);
    }

    #[test]
    fn test_submit_request_tolerates_malformed_pairs() {
        let request: SubmitAnswersRequest = serde_json::from_str(
            r#"{"attemptToken":"abc","answers":[
                {"questionId":1,"selectedIndex":1},
                {"questionId":2,"selectedIndex":"0"},
                {"questionId":"4","selectedIndex":" 3 "},
                7,
                {"questionId":"x","selectedIndex":1},
                {"questionId":5,"selectedIndex":"two"}
            ]}"#,
        )
        .unwrap();
        let answers = request.answers.unwrap();

        let pairs: Vec<_> = answers
            .iter()
            .map(|a| (a.question_id, a.selected_index))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Some(1), Some(1)),
                (Some(2), Some(0)),
                (Some(4), Some(3)),
                (None, None),
                (None, Some(1)),
                (Some(5), None),
            ]
        );
    }

    #[test]
    fn test_count_accepts_numeric_strings() {
        let request: ExamRequest =
            serde_json::from_str(r#"{"kind":"mcq","numberOfQuestions":"7"}"#).unwrap();
        assert_eq!(request.params().unwrap().count, 7);

        let request: ExamRequest = serde_json::from_str(r#"{"count":"many"}"#).unwrap();
        assert_eq!(request.params().unwrap().count, 20);

        let request: ExamRequest = serde_json::from_str(r#"{"count":null}"#).unwrap();
        assert_eq!(request.count, None);
    }

    #[test]
    fn test_submit_request_rejects_non_list_answers() {
        let parsed =
            serde_json::from_str::<SubmitAnswersRequest>(r#"{"attemptToken":"abc","answers":"1"}"#);
        assert!(parsed.is_err());
    }
}
