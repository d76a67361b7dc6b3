// src/services/guard.rs

//! Attempt authorization: may this student submit against this quiz right now?

use crate::{
    db::Store,
    error::AppError,
    models::{quiz::Quiz, submission::Submission},
};

/// Why a submit attempt is refused.
#[derive(Debug)]
pub enum Denial {
    QuizNotFound,
    ClassroomNotFound,
    NotEnrolled,
    /// Carries the earlier result so the caller can show it.
    AlreadySubmitted(Box<Submission>),
}

#[derive(Debug)]
pub enum AttemptDecision {
    /// The quiz as loaded for the check, ready for grading.
    Allowed(Quiz),
    Denied(Denial),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::QuizNotFound => AppError::NotFound("Quiz not found".to_string()),
            Denial::ClassroomNotFound => AppError::NotFound("Classroom not found".to_string()),
            Denial::NotEnrolled => {
                AppError::Forbidden("You are not enrolled in this quiz's classroom".to_string())
            }
            Denial::AlreadySubmitted(existing) => AppError::AlreadySubmitted(existing),
        }
    }
}

/// Checks, in order: the quiz exists, the student is on its classroom roster,
/// and no submission exists yet for the pair. Read-only.
///
/// The prior-attempt check is a fast path only; the ledger's uniqueness
/// constraint is what actually holds the single-attempt invariant.
pub async fn can_submit(
    store: &dyn Store,
    quiz_id: i64,
    student_id: i64,
) -> Result<AttemptDecision, AppError> {
    let Some(quiz) = store.find_quiz(quiz_id).await? else {
        return Ok(AttemptDecision::Denied(Denial::QuizNotFound));
    };

    let Some(classroom) = store.find_classroom(quiz.classroom_id).await? else {
        return Ok(AttemptDecision::Denied(Denial::ClassroomNotFound));
    };

    if !classroom.is_enrolled(student_id) {
        return Ok(AttemptDecision::Denied(Denial::NotEnrolled));
    }

    if let Some(existing) = store.find_submission_for(quiz_id, student_id).await? {
        return Ok(AttemptDecision::Denied(Denial::AlreadySubmitted(Box::new(
            existing,
        ))));
    }

    Ok(AttemptDecision::Allowed(quiz))
}

/// A teacher holds grading rights over a quiz if they created it or are the
/// assigned teacher of its classroom. Resolved from stored data only.
pub async fn is_quiz_instructor(
    store: &dyn Store,
    quiz: &Quiz,
    teacher_id: i64,
) -> Result<bool, AppError> {
    if quiz.created_by == teacher_id {
        return Ok(true);
    }

    Ok(store
        .find_classroom(quiz.classroom_id)
        .await?
        .is_some_and(|c| c.teacher_id == teacher_id))
}
