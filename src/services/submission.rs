// src/services/submission.rs

use crate::{
    db::Store,
    error::AppError,
    grading,
    models::{
        submission::{
            NewSubmission, QuizSubmissionEntry, StudentSubmissionEntry, Submission,
            SubmittedAnswer,
        },
        user::{Actor, Role},
    },
    services::guard::{self, AttemptDecision},
};

/// Guard, grade, then a single ledger insert.
///
/// Losing an insert race to a concurrent submit is reported exactly like the
/// guard's "already submitted" denial.
pub async fn submit_quiz(
    store: &dyn Store,
    actor: Actor,
    quiz_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<Submission, AppError> {
    if actor.role != Role::Student {
        return Err(AppError::Forbidden(
            "Only students can submit quizzes".to_string(),
        ));
    }

    let quiz = match guard::can_submit(store, quiz_id, actor.id).await? {
        AttemptDecision::Allowed(quiz) => quiz,
        AttemptDecision::Denied(denial) => {
            tracing::warn!(
                "Submit denied for student {} on quiz {}: {:?}",
                actor.id,
                quiz_id,
                denial
            );
            return Err(denial.into());
        }
    };

    let result = grading::grade(&quiz.questions, answers);

    let created = store
        .create_submission(NewSubmission {
            quiz_id,
            student_id: actor.id,
            result,
        })
        .await;

    match created {
        Ok(submission) => {
            tracing::info!(
                "Student {} submitted quiz {}: {}/{} ({}%)",
                actor.id,
                quiz_id,
                submission.score,
                submission.total_questions,
                submission.percentage
            );
            Ok(submission)
        }
        Err(AppError::Conflict(_)) => {
            tracing::warn!(
                "Concurrent submit for student {} on quiz {} rejected by ledger",
                actor.id,
                quiz_id
            );
            match store.find_submission_for(quiz_id, actor.id).await? {
                Some(existing) => Err(AppError::AlreadySubmitted(Box::new(existing))),
                None => Err(AppError::Conflict(
                    "Quiz was submitted concurrently, please retry".to_string(),
                )),
            }
        }
        Err(e) => Err(e),
    }
}

/// Deletes a submission so the student can take the quiz again.
///
/// Teachers only: the quiz's creator or its classroom's assigned teacher.
/// Returns the removed submission.
pub async fn allow_reattempt(
    store: &dyn Store,
    actor: Actor,
    submission_id: i64,
) -> Result<Submission, AppError> {
    if actor.role != Role::Teacher {
        return Err(AppError::Forbidden(
            "Only teachers can allow reattempts".to_string(),
        ));
    }

    let submission = store
        .find_submission(submission_id)
        .await?
        .ok_or(AppError::NotFound("Submission not found".to_string()))?;

    let quiz = store.find_quiz(submission.quiz_id).await?.ok_or_else(|| {
        AppError::InternalServerError(format!(
            "submission {} references missing quiz {}",
            submission.id, submission.quiz_id
        ))
    })?;

    if !guard::is_quiz_instructor(store, &quiz, actor.id).await? {
        tracing::warn!(
            "Teacher {} tried to reopen submission {} of quiz {} without rights",
            actor.id,
            submission_id,
            quiz.id
        );
        return Err(AppError::Forbidden(
            "You are not authorized to delete this submission".to_string(),
        ));
    }

    if !store.delete_submission(submission_id).await? {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }

    tracing::info!(
        "Teacher {} reopened quiz {} for student {} (submission {})",
        actor.id,
        quiz.id,
        submission.student_id,
        submission_id
    );
    Ok(submission)
}

/// The calling student's own submissions, newest first.
pub async fn student_history(
    store: &dyn Store,
    actor: Actor,
) -> Result<Vec<StudentSubmissionEntry>, AppError> {
    if actor.role != Role::Student {
        return Err(AppError::Forbidden(
            "Only students can access their submissions".to_string(),
        ));
    }

    store.list_by_student(actor.id).await
}

/// All submissions for a quiz, for a teacher with grading rights over it.
pub async fn quiz_submissions(
    store: &dyn Store,
    actor: Actor,
    quiz_id: i64,
) -> Result<Vec<QuizSubmissionEntry>, AppError> {
    if actor.role != Role::Teacher {
        return Err(AppError::Forbidden(
            "Only teachers can view quiz submissions".to_string(),
        ));
    }

    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    if !guard::is_quiz_instructor(store, &quiz, actor.id).await? {
        return Err(AppError::Forbidden(
            "You are not authorized to view submissions for this quiz".to_string(),
        ));
    }

    store.list_by_quiz(quiz_id).await
}
