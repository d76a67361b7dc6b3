// src/models/classroom.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A classroom with its enrollment roster.
/// `student_ids` is aggregated from the `classroom_students` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classroom {
    pub id: i64,
    pub name: String,
    /// Generated join code, unique across classrooms.
    pub code: String,
    /// The assigned teacher.
    pub teacher_id: i64,
    pub student_ids: Vec<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Classroom {
    pub fn is_enrolled(&self, student_id: i64) -> bool {
        self.student_ids.contains(&student_id)
    }
}

/// Which classrooms a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassroomScope {
    All,
    TaughtBy(i64),
    EnrolledIn(i64),
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassroomRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub teacher_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTeacherRequest {
    pub teacher_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollStudentRequest {
    pub student_id: i64,
}
