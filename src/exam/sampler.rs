// src/exam/sampler.rs

use std::collections::HashSet;

use rand::seq::SliceRandom;

use crate::{
    error::AppError,
    exam::resolver,
    models::question::{ExamKind, Question, QuestionKind},
    store::QuestionBank,
};

/// Draws up to `count` distinct questions of one kind, options embedded.
/// A short result means the bank ran out; it is not an error.
pub async fn sample_by_kind(
    bank: &dyn QuestionBank,
    kind: QuestionKind,
    count: usize,
    category: Option<&str>,
    exclude: &[i64],
) -> Result<Vec<Question>, AppError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let records = bank.sample(kind, count, category, exclude).await?;

    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(records.len().min(count));
    for record in records {
        if record.kind != kind || exclude.contains(&record.id) || !seen.insert(record.id) {
            continue;
        }
        let options = resolver::options_for(bank, record.id).await?;
        questions.push(Question::new(record, options));
        if questions.len() == count {
            break;
        }
    }

    Ok(questions)
}

/// Half mcq (rounded down), the rest voice. A kind that comes up short is
/// topped up from the other kind; the merged set is shuffled and capped at
/// `total`.
pub async fn sample_mixed(
    bank: &dyn QuestionBank,
    total: usize,
    category: Option<&str>,
) -> Result<Vec<Question>, AppError> {
    let mcq_quota = total / 2;
    let voice_quota = total - mcq_quota;

    let mut mcq = sample_by_kind(bank, QuestionKind::Mcq, mcq_quota, category, &[]).await?;
    let mut voice = sample_by_kind(bank, QuestionKind::Voice, voice_quota, category, &[]).await?;

    if mcq.len() < mcq_quota {
        let shortfall = mcq_quota - mcq.len();
        tracing::debug!("mcq pool short by {}, topping up with voice", shortfall);
        let drawn = ids(&voice);
        let top_up =
            sample_by_kind(bank, QuestionKind::Voice, shortfall, category, &drawn).await?;
        voice.extend(top_up);
    }

    if voice.len() < voice_quota {
        let shortfall = voice_quota - voice.len();
        tracing::debug!("voice pool short by {}, topping up with mcq", shortfall);
        let drawn = ids(&mcq);
        let top_up = sample_by_kind(bank, QuestionKind::Mcq, shortfall, category, &drawn).await?;
        mcq.extend(top_up);
    }

    let mut all = mcq;
    all.extend(voice);
    all.shuffle(&mut rand::thread_rng());
    all.truncate(total);

    Ok(all)
}

/// Dispatches on the requested exam kind.
pub async fn sample(
    bank: &dyn QuestionBank,
    kind: ExamKind,
    count: usize,
    category: Option<&str>,
) -> Result<Vec<Question>, AppError> {
    match kind {
        ExamKind::Mcq => sample_by_kind(bank, QuestionKind::Mcq, count, category, &[]).await,
        ExamKind::Voice => sample_by_kind(bank, QuestionKind::Voice, count, category, &[]).await,
        ExamKind::Both => sample_mixed(bank, count, category).await,
    }
}

fn ids(questions: &[Question]) -> Vec<i64> {
    questions.iter().map(|q| q.id).collect()
}
