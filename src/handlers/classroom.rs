// src/handlers/classroom.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    db::DynStore,
    error::AppError,
    models::{classroom::ClassroomScope, user::Role},
    utils::jwt::Claims,
};

/// Classrooms visible to the caller: taught ones for teachers, enrolled ones
/// for students, all of them for admins.
pub async fn list_classrooms(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let actor = claims.actor()?;

    let scope = match actor.role {
        Role::Admin => ClassroomScope::All,
        Role::Teacher => ClassroomScope::TaughtBy(actor.id),
        Role::Student => ClassroomScope::EnrolledIn(actor.id),
    };

    Ok(Json(store.list_classrooms(scope).await?))
}
