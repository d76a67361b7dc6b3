// src/handlers/admin.rs

//! Account and classroom provisioning. Mounted behind `admin_middleware`.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    db::DynStore,
    error::AppError,
    models::{
        classroom::{AssignTeacherRequest, CreateClassroomRequest, EnrollStudentRequest},
        user::{CreateUserRequest, NewUser, Role, User},
    },
    utils::{hash::hash_password, html::clean_html},
};

/// Lists all users in the system, newest first.
pub async fn list_users(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await?;
    Ok(Json(users))
}

/// Creates a student or teacher account. Admins are only seeded at startup.
pub async fn create_user(
    State(store): State<DynStore>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    if payload.role == Role::Admin {
        return Err(AppError::BadRequest(
            "Role must be either 'student' or 'teacher'".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .create_user(NewUser {
            name: clean_html(payload.name.trim()),
            email: email.clone(),
            password: hashed_password,
            role: payload.role,
        })
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!("Email '{}' already registered", email)),
            other => other,
        })?;

    tracing::info!("Created {} account {}", user.role, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Loads a user and checks it holds `role`: 404 if missing, 400 if the role differs.
async fn require_role(store: &DynStore, id: i64, role: Role) -> Result<User, AppError> {
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    if user.role != role {
        return Err(AppError::BadRequest(format!("User {} is not a {}", id, role)));
    }
    Ok(user)
}

/// Eight uppercase hex characters from a random UUID.
fn generate_classroom_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

pub async fn create_classroom(
    State(store): State<DynStore>,
    payload: Result<Json<CreateClassroomRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let name = clean_html(payload.name.trim());
    if name.is_empty() {
        return Err(AppError::BadRequest("Classroom name cannot be empty".to_string()));
    }

    let teacher = require_role(&store, payload.teacher_id, Role::Teacher).await?;

    let classroom = store
        .create_classroom(&name, &generate_classroom_code(), teacher.id)
        .await?;

    tracing::info!(
        "Created classroom {} ({}) for teacher {}",
        classroom.id,
        classroom.code,
        teacher.id
    );
    Ok((StatusCode::CREATED, Json(classroom)))
}

pub async fn assign_teacher(
    State(store): State<DynStore>,
    Path(classroom_id): Path<i64>,
    payload: Result<Json<AssignTeacherRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let teacher = require_role(&store, payload.teacher_id, Role::Teacher).await?;

    if !store.assign_teacher(classroom_id, teacher.id).await? {
        return Err(AppError::NotFound("Classroom not found".to_string()));
    }

    tracing::info!("Assigned teacher {} to classroom {}", teacher.id, classroom_id);

    let classroom = store
        .find_classroom(classroom_id)
        .await?
        .ok_or(AppError::NotFound("Classroom not found".to_string()))?;
    Ok(Json(classroom))
}

/// Enrolling an already-enrolled student succeeds without changes.
pub async fn enroll_student(
    State(store): State<DynStore>,
    Path(classroom_id): Path<i64>,
    payload: Result<Json<EnrollStudentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if store.find_classroom(classroom_id).await?.is_none() {
        return Err(AppError::NotFound("Classroom not found".to_string()));
    }
    let student = require_role(&store, payload.student_id, Role::Student).await?;

    let added = store.enroll_student(classroom_id, student.id).await?;
    if added {
        tracing::info!("Enrolled student {} in classroom {}", student.id, classroom_id);
    }

    let message = if added {
        "Student enrolled"
    } else {
        "Student already enrolled"
    };

    Ok(Json(json!({
        "message": message,
        "classroomId": classroom_id,
        "studentId": student.id
    })))
}
