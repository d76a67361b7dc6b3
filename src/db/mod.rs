// src/db/mod.rs

//! Storage handles.
//!
//! Each collection has its own repository trait; [`Store`] bundles them so the
//! application state can hold one `Arc<dyn Store>` created at startup.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        classroom::{Classroom, ClassroomScope},
        question::QuestionDraft,
        quiz::{NewQuiz, Quiz, QuizScope},
        submission::{NewSubmission, QuizSubmissionEntry, StudentSubmissionEntry, Submission},
        user::{NewUser, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Newest first.
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}

#[async_trait]
pub trait ClassroomRepository: Send + Sync {
    async fn create_classroom(
        &self,
        name: &str,
        code: &str,
        teacher_id: i64,
    ) -> Result<Classroom, AppError>;

    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, AppError>;

    async fn list_classrooms(&self, scope: ClassroomScope) -> Result<Vec<Classroom>, AppError>;

    /// Returns `false` if the classroom does not exist.
    async fn assign_teacher(&self, classroom_id: i64, teacher_id: i64) -> Result<bool, AppError>;

    /// Returns `false` if the student was already enrolled.
    async fn enroll_student(&self, classroom_id: i64, student_id: i64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create_quiz(&self, new_quiz: NewQuiz) -> Result<Quiz, AppError>;

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;

    async fn list_quizzes(&self, scope: QuizScope) -> Result<Vec<Quiz>, AppError>;

    /// Replaces title and question set. Drafts carrying the id of one of this
    /// quiz's current questions keep that id; all others get fresh ids.
    /// Returns `None` if the quiz does not exist.
    async fn replace_quiz(
        &self,
        id: i64,
        title: &str,
        questions: Vec<QuestionDraft>,
    ) -> Result<Option<Quiz>, AppError>;

    /// Deletes the quiz's submissions and then the quiz, atomically.
    /// Returns the number of submissions removed, or `None` if the quiz does not exist.
    async fn delete_quiz_cascade(&self, id: i64) -> Result<Option<u64>, AppError>;
}

/// The durable record of graded attempts.
#[async_trait]
pub trait SubmissionLedger: Send + Sync {
    /// Atomic insert. Fails with `Conflict` when a submission already exists
    /// for the same (quiz, student) pair, and `NotFound` when the quiz is gone.
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, AppError>;

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, AppError>;

    async fn find_submission_for(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError>;

    /// Returns `false` if no such submission exists.
    async fn delete_submission(&self, id: i64) -> Result<bool, AppError>;

    /// Most recent first.
    async fn list_by_student(&self, student_id: i64)
    -> Result<Vec<StudentSubmissionEntry>, AppError>;

    /// Most recent first.
    async fn list_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizSubmissionEntry>, AppError>;
}

pub trait Store: UserRepository + ClassroomRepository + QuizRepository + SubmissionLedger {}

impl<T> Store for T where T: UserRepository + ClassroomRepository + QuizRepository + SubmissionLedger
{}

pub type DynStore = Arc<dyn Store>;

/// For each draft, the existing question id it keeps, if any.
///
/// A draft keeps its id only when that id belongs to `current` and no earlier
/// draft already claimed it.
pub(crate) fn kept_question_ids(drafts: &[QuestionDraft], current: &[i64]) -> Vec<Option<i64>> {
    let mut claimed = std::collections::HashSet::new();
    drafts
        .iter()
        .map(|d| d.id.filter(|id| current.contains(id) && claimed.insert(*id)))
        .collect()
}
