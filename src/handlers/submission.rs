// src/handlers/submission.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
    response::IntoResponse,
};
use serde_json::json;

use crate::{db::DynStore, error::AppError, services::submission, utils::jwt::Claims};

/// The calling student's submission history.
pub async fn my_submissions(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    Ok(Json(submission::student_history(store.as_ref(), actor).await?))
}

pub async fn quiz_submissions(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    quiz_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(quiz_id) = quiz_id?;
    Ok(Json(
        submission::quiz_submissions(store.as_ref(), actor, quiz_id).await?,
    ))
}

/// Grants a reattempt by deleting the student's submission.
pub async fn allow_reattempt(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    submission_id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;
    let Path(submission_id) = submission_id?;

    submission::allow_reattempt(store.as_ref(), actor, submission_id).await?;

    Ok(Json(json!({
        "message": "Submission deleted. The student can now reattempt the quiz."
    })))
}
