// src/exam/resolver.rs

use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        exam::lenient_int,
        question::{ExamOption, OptionRecord, QuestionKind},
    },
    store::QuestionBank,
};

/// Display options of a question, ascending by order index.
pub async fn options_for(
    bank: &dyn QuestionBank,
    question_id: i64,
) -> Result<Vec<ExamOption>, AppError> {
    Ok(ordered_options(bank, question_id)
        .await?
        .into_iter()
        .map(ExamOption::from)
        .collect())
}

async fn ordered_options(
    bank: &dyn QuestionBank,
    question_id: i64,
) -> Result<Vec<OptionRecord>, AppError> {
    let mut options = bank.options(question_id).await?;
    options.sort_by_key(|o| o.order_index);
    Ok(options)
}

/// Decodes a stored mcq index collection. Accepts integers and numeric
/// strings; anything else is dropped and an unreadable document is empty.
pub fn decode_answer_indices(raw: &str) -> BTreeSet<i64> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return BTreeSet::new();
    };

    items.iter().filter_map(lenient_int).collect()
}

/// Order index of the first option whose text equals `canonical` exactly.
pub fn match_canonical_answer(options: &[OptionRecord], canonical: &str) -> Option<i64> {
    options
        .iter()
        .find(|o| o.text.as_deref() == Some(canonical))
        .map(|o| i64::from(o.order_index))
}

/// What counts as correct for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectAnswer {
    /// mcq: any member of the set is correct.
    Indices(BTreeSet<i64>),
    /// voice: the option matching the canonical text, if one does.
    Index(Option<i64>),
}

/// Everything grading needs to know about one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    pub kind: QuestionKind,
    pub options: Vec<OptionRecord>,
    pub correct: CorrectAnswer,
}

impl AnswerKey {
    /// A missing selection is never correct.
    pub fn is_correct(&self, selected: Option<i64>) -> bool {
        let Some(selected) = selected else {
            return false;
        };
        match &self.correct {
            CorrectAnswer::Indices(set) => set.contains(&selected),
            CorrectAnswer::Index(index) => *index == Some(selected),
        }
    }

    pub fn option_text(&self, index: i64) -> Option<&str> {
        self.options
            .iter()
            .find(|o| i64::from(o.order_index) == index)
            .and_then(|o| o.text.as_deref())
    }
}

/// Resolves the answer key of a question, or `None` when its kind is unknown.
pub async fn answer_key(
    bank: &dyn QuestionBank,
    question_id: i64,
) -> Result<Option<AnswerKey>, AppError> {
    let Some(kind) = bank.question_kind(question_id).await? else {
        return Ok(None);
    };

    let options = ordered_options(bank, question_id).await?;
    let correct = match kind {
        QuestionKind::Mcq => CorrectAnswer::Indices(
            bank.mcq_answer_indices(question_id)
                .await?
                .map(|raw| decode_answer_indices(&raw))
                .unwrap_or_default(),
        ),
        QuestionKind::Voice => CorrectAnswer::Index(
            bank.voice_answer_text(question_id)
                .await?
                .and_then(|text| match_canonical_answer(&options, &text)),
        ),
    };

    Ok(Some(AnswerKey {
        kind,
        options,
        correct,
    }))
}
