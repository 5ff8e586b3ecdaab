// src/exam/grader.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    exam::resolver::{self, AnswerKey, CorrectAnswer},
    models::{
        attempt::Attempt,
        exam::{GradeDetail, SubmittedAnswer, Summary},
    },
    store::QuestionBank,
};

/// One graded pair plus the option text the student picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub detail: GradeDetail,
    pub selected_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grading {
    pub summary: Summary,
    pub answers: Vec<GradedAnswer>,
}

impl Grading {
    pub fn details(&self) -> Vec<GradeDetail> {
        self.answers.iter().map(|a| a.detail.clone()).collect()
    }
}

/// Answers that name a question offered by the attempt.
fn retained<'a>(
    attempt: &'a Attempt,
    answers: &'a [SubmittedAnswer],
) -> impl Iterator<Item = (i64, Option<i64>)> + 'a {
    answers.iter().filter_map(move |answer| {
        let question_id = answer.question_id?;
        if !attempt.offers(question_id) {
            tracing::debug!("Dropping answer for question {} outside the attempt", question_id);
            return None;
        }
        Some((question_id, answer.selected_index))
    })
}

/// Fetches the answer key of every question the submission may grade.
/// Questions whose kind cannot be resolved are left out.
pub async fn load_answer_keys(
    bank: &dyn QuestionBank,
    attempt: &Attempt,
    answers: &[SubmittedAnswer],
) -> Result<HashMap<i64, AnswerKey>, AppError> {
    let mut keys = HashMap::new();
    for (question_id, _) in retained(attempt, answers) {
        if keys.contains_key(&question_id) {
            continue;
        }
        match resolver::answer_key(bank, question_id).await? {
            Some(key) => {
                keys.insert(question_id, key);
            }
            None => tracing::warn!("Question {} has no resolvable kind", question_id),
        }
    }
    Ok(keys)
}

/// Grades a submission against pre-fetched answer keys.
///
/// Pure: the same inputs always produce the same grading. Pairs outside the
/// attempt or without an answer key are skipped; nothing here fails.
pub fn grade(
    attempt: &Attempt,
    answers: &[SubmittedAnswer],
    keys: &HashMap<i64, AnswerKey>,
) -> Grading {
    let mut graded = Vec::new();
    let mut correct = 0u32;

    for (question_id, selected_index) in retained(attempt, answers) {
        let Some(key) = keys.get(&question_id) else {
            continue;
        };

        let is_correct = key.is_correct(selected_index);
        if is_correct {
            correct += 1;
        }

        let (correct_indices, correct_index) = match &key.correct {
            CorrectAnswer::Indices(set) => (set.iter().copied().collect(), None),
            CorrectAnswer::Index(index) => (Vec::new(), *index),
        };

        graded.push(GradedAnswer {
            detail: GradeDetail {
                question_id,
                kind: key.kind,
                selected_index,
                is_correct,
                correct_indices,
                correct_index,
            },
            selected_text: selected_index
                .and_then(|index| key.option_text(index))
                .map(str::to_string),
        });
    }

    Grading {
        summary: Summary::from_counts(graded.len() as u32, correct),
        answers: graded,
    }
}
