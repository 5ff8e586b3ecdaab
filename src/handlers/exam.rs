// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    exam::ExamService,
    models::{
        exam::{ExamRequest, SubmitAnswersRequest},
        exam_result::ResultsQuery,
    },
    utils::{
        extract::{ApiJson, ApiQuery},
        jwt::CurrentUser,
    },
};

/// Starts an exam attempt.
///
/// Samples questions of the requested kind and returns them together with the
/// attempt token the submission must carry. No answer data is included.
pub async fn start_exam(
    State(exam): State<Arc<ExamService>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<ExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = exam.start_exam(payload, user.identity()).await?;
    Ok(Json(response))
}

/// Practice set: same sampling as `start_exam`, no attempt is opened.
pub async fn fetch_questions(
    State(exam): State<Arc<ExamService>>,
    ApiQuery(params): ApiQuery<ExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = exam.fetch_questions(params).await?;
    Ok(Json(response))
}

/// Grades a submission.
///
/// Students additionally get their result saved; `resultId` is null otherwise.
pub async fn submit_answers(
    State(exam): State<Arc<ExamService>>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<SubmitAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = exam.submit_answers(payload, user.identity()).await?;
    Ok(Json(response))
}

pub async fn list_results(
    State(exam): State<Arc<ExamService>>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let student = user.require_student()?;
    let page = exam
        .student_results(student, query.limit, query.offset)
        .await?;
    Ok(Json(page))
}

pub async fn result_stats(
    State(exam): State<Arc<ExamService>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let student = user.require_student()?;
    let stats = exam.student_statistics(student).await?;
    Ok(Json(stats))
}
