// src/models/exam_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{attempt::Attempt, exam::Summary, question::ExamKind};

/// Lifecycle tag stored with a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    InProgress,
    Submitted,
    Graded,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::InProgress => "in_progress",
            ResultStatus::Submitted => "submitted",
            ResultStatus::Graded => "graded",
        }
    }

    /// Unknown tags read back as `Submitted`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "in_progress" => ResultStatus::InProgress,
            "graded" => ResultStatus::Graded,
            _ => ResultStatus::Submitted,
        }
    }
}

/// Represents the 'exam_results' table in the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: i64,
    /// `None` for mock exams assembled from the bank.
    pub exam_id: Option<i64>,
    pub student_id: String,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub time_taken: i64,
    pub status: ResultStatus,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

/// Raw row; `status` is stored as text.
#[derive(Debug, FromRow)]
pub struct ExamResultRow {
    pub id: i64,
    pub exam_id: Option<i64>,
    pub student_id: String,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub time_taken: i64,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

impl From<ExamResultRow> for ExamResult {
    fn from(row: ExamResultRow) -> Self {
        Self {
            id: row.id,
            exam_id: row.exam_id,
            student_id: row.student_id,
            score: row.score,
            total_marks: row.total_marks,
            percentage: row.percentage,
            time_taken: row.time_taken,
            status: ResultStatus::parse(&row.status),
            started_at: row.started_at,
            submitted_at: row.submitted_at,
        }
    }
}

/// A result ready to be handed to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExamResult {
    pub exam_id: Option<i64>,
    pub student_id: String,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub time_taken: i64,
    pub status: ResultStatus,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
}

impl NewExamResult {
    /// One mark per correct answer; elapsed time is never negative.
    pub fn from_summary(
        student_id: String,
        attempt: &Attempt,
        summary: &Summary,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let time_taken = (submitted_at - attempt.started_at).num_seconds().max(0);

        Self {
            exam_id: None,
            student_id,
            score: summary.correct as i32,
            total_marks: summary.total as i32,
            percentage: f64::from(summary.percentage),
            time_taken,
            status: ResultStatus::Submitted,
            started_at: attempt.started_at,
            submitted_at,
        }
    }
}

/// One audit row per graded pair. Written for traceability, never re-read by grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerAudit {
    pub attempt_token: String,
    pub user_id: Option<String>,
    pub exam_kind: ExamKind,
    pub question_id: i64,
    pub selected_index: Option<i64>,
    pub selected_text: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResultsQuery {
    pub limit: i64,
    pub offset: i64,
}

impl Default for ResultsQuery {
    fn default() -> Self {
        Self {
            limit: crate::config::DEFAULT_RESULTS_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsPage {
    pub results: Vec<ExamResult>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDistribution {
    /// 75% and above.
    pub excellent: u32,
    /// 50% up to 75%.
    pub good: u32,
    /// Below 50%.
    pub needs_improvement: u32,
}

/// Aggregates over a student's ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStatistics {
    pub total_exams: u32,
    pub average_percentage: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub average_time_minutes: f64,
    pub distribution: ScoreDistribution,
}

impl ResultStatistics {
    pub fn from_results(results: &[ExamResult]) -> Self {
        if results.is_empty() {
            return Self {
                total_exams: 0,
                average_percentage: 0.0,
                best_score: 0.0,
                worst_score: 0.0,
                average_time_minutes: 0.0,
                distribution: ScoreDistribution::default(),
            };
        }

        let count = results.len() as f64;
        let mut distribution = ScoreDistribution::default();
        let mut best = f64::MIN;
        let mut worst = f64::MAX;
        let mut percentage_sum = 0.0;
        let mut time_sum = 0.0;

        for result in results {
            best = best.max(result.percentage);
            worst = worst.min(result.percentage);
            percentage_sum += result.percentage;
            time_sum += result.time_taken as f64;

            if result.percentage >= 75.0 {
                distribution.excellent += 1;
            } else if result.percentage >= 50.0 {
                distribution.good += 1;
            } else {
                distribution.needs_improvement += 1;
            }
        }

        Self {
            total_exams: results.len() as u32,
            average_percentage: round_to(percentage_sum / count, 2),
            best_score: round_to(best, 2),
            worst_score: round_to(worst, 2),
            average_time_minutes: round_to(time_sum / count / 60.0, 1),
            distribution,
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
