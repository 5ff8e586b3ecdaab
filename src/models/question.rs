// src/models/question.rs

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Question modality stored in the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Select one or more of the four options.
    Mcq,
    /// Free response resolved against a canonical option text.
    Voice,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Voice => "voice",
        }
    }

    /// Parses the stored type tag. Unknown tags yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "mcq" => Some(QuestionKind::Mcq),
            "voice" => Some(QuestionKind::Voice),
            _ => None,
        }
    }
}

/// Kind requested for a whole exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Mcq,
    Voice,
    /// Balanced draw across both question kinds.
    Both,
}

impl ExamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamKind::Mcq => "mcq",
            ExamKind::Voice => "voice",
            ExamKind::Both => "both",
        }
    }

    /// Trims and lower-cases the raw value before matching it.
    pub fn from_input(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_lowercase().as_str() {
            "mcq" => Ok(ExamKind::Mcq),
            "voice" => Ok(ExamKind::Voice),
            "both" => Ok(ExamKind::Both),
            _ => Err(AppError::BadRequest("Invalid exam kind".to_string())),
        }
    }
}

/// Whether an mcq question has one or several correct options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerArity {
    Single,
    Multiple,
}

impl AnswerArity {
    pub fn from_db(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("multiple") => AnswerArity::Multiple,
            _ => AnswerArity::Single,
        }
    }
}

/// A question row as read from the bank, without its options.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub id: i64,
    pub kind: QuestionKind,
    pub text: Option<String>,
    pub format: Option<String>,
    pub image: Option<String>,
    pub answer_type: Option<String>,
    pub audio: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub time_limit: Option<i32>,
}

/// An option row as read from the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecord {
    /// Zero-based display position; doubles as the selection index.
    pub order_index: i32,
    pub text: Option<String>,
    pub image: Option<String>,
}

/// Option as shown to the exam taker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamOption {
    pub text: Option<String>,
    pub image: Option<String>,
}

impl From<OptionRecord> for ExamOption {
    fn from(record: OptionRecord) -> Self {
        Self {
            text: record.text,
            image: record.image,
        }
    }
}

/// Kind-specific part of a question payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QuestionVariant {
    Mcq {
        #[serde(rename = "answerArity")]
        answer_arity: AnswerArity,
    },
    Voice {
        #[serde(rename = "timeLimit")]
        time_limit: Option<i32>,
    },
}

/// Question payload handed out before grading. Never carries answer data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    #[serde(flatten)]
    pub variant: QuestionVariant,
    pub text: Option<String>,
    pub format: Option<String>,
    pub image: Option<String>,
    pub audio_ref: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub options: Vec<ExamOption>,
}

impl Question {
    pub fn new(record: QuestionRecord, options: Vec<ExamOption>) -> Self {
        let variant = match record.kind {
            QuestionKind::Mcq => QuestionVariant::Mcq {
                answer_arity: AnswerArity::from_db(record.answer_type.as_deref()),
            },
            QuestionKind::Voice => QuestionVariant::Voice {
                time_limit: record.time_limit,
            },
        };

        Self {
            id: record.id,
            variant,
            text: record.text,
            format: record.format,
            image: record.image,
            audio_ref: record.audio,
            difficulty: record.difficulty,
            category: record.category,
            options,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self.variant {
            QuestionVariant::Mcq { .. } => QuestionKind::Mcq,
            QuestionVariant::Voice { .. } => QuestionKind::Voice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: QuestionKind) -> QuestionRecord {
        QuestionRecord {
            id: 7,
            kind,
            text: Some("Which planet is largest?".to_string()),
            format: Some("text".to_string()),
            image: None,
            answer_type: Some("multiple".to_string()),
            audio: None,
            difficulty: Some("easy".to_string()),
            category: Some("space".to_string()),
            time_limit: Some(30),
        }
    }

    #[test]
    fn test_exam_kind_from_input_normalizes() {
        assert_eq!(ExamKind::from_input(" MCQ ").unwrap(), ExamKind::Mcq);
        assert_eq!(ExamKind::from_input("Both").unwrap(), ExamKind::Both);
        assert!(matches!(
            ExamKind::from_input("essay"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_question_kind_parse_rejects_unknown() {
        assert_eq!(QuestionKind::parse("voice"), Some(QuestionKind::Voice));
        assert_eq!(QuestionKind::parse("Voice"), None);
    }

    #[test]
    fn test_mcq_payload_carries_arity_not_time_limit() {
        let question = Question::new(record(QuestionKind::Mcq), Vec::new());
        let json = serde_json::to_value(&question).unwrap();

        assert_eq!(json["kind"], "mcq");
        assert_eq!(json["answerArity"], "multiple");
        assert!(json.get("timeLimit").is_none());
        assert_eq!(json["audioRef"], serde_json::Value::Null);
    }

    #[test]
    fn test_voice_payload_carries_time_limit() {
        let question = Question::new(record(QuestionKind::Voice), Vec::new());
        let json = serde_json::to_value(&question).unwrap();

        assert_eq!(question.kind(), QuestionKind::Voice);
        assert_eq!(json["kind"], "voice");
        assert_eq!(json["timeLimit"], 30);
        assert!(json.get("answerArity").is_none());
    }
}
