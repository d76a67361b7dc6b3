// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    db::DynStore,
    error::AppError,
    models::{
        quiz::{CreateQuizRequest, UpdateQuizRequest},
        submission::{SubmissionReceipt, SubmitQuizRequest},
    },
    services::{quiz, submission},
    utils::jwt::Claims,
};

pub async fn list_quizzes(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    Ok(Json(quiz::list_quizzes(store.as_ref(), actor).await?))
}

/// Creates a quiz. Returns 201 with the stored quiz, answers included.
pub async fn create_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Json(payload) = payload?;

    let created = quiz::create_quiz(store.as_ref(), actor, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(id) = id?;
    Ok(Json(quiz::get_quiz(store.as_ref(), actor, id).await?))
}

pub async fn update_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(id) = id?;
    let Json(payload) = payload?;

    Ok(Json(quiz::update_quiz(store.as_ref(), actor, id, payload).await?))
}

/// Deletes the quiz together with all of its submissions.
pub async fn delete_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(id) = id?;

    let deleted = quiz::delete_quiz(store.as_ref(), actor, id).await?;

    Ok(Json(json!({
        "message": "Quiz and its submissions deleted",
        "deletedSubmissions": deleted
    })))
}

/// Submits answers for grading.
///
/// 201 with the graded receipt. A second attempt gets 403 carrying the first
/// attempt's result.
pub async fn submit_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(quiz_id) = id?;
    let Json(payload) = payload?;

    let stored = submission::submit_quiz(store.as_ref(), actor, quiz_id, &payload.answers).await?;

    Ok((StatusCode::CREATED, Json(SubmissionReceipt::from(stored))))
}
