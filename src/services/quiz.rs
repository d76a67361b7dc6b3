// src/services/quiz.rs

use validator::Validate;

use crate::{
    db::Store,
    error::AppError,
    models::{
        quiz::{
            CreateQuizRequest, NewQuiz, PublicQuiz, Quiz, QuizScope, QuizView, UpdateQuizRequest,
            normalize_questions, normalize_title,
        },
        user::{Actor, Role},
    },
    services::guard,
};

/// Admins and the quiz's creator may edit or delete it.
fn can_modify(actor: Actor, quiz: &Quiz) -> bool {
    actor.is_admin() || (actor.role == Role::Teacher && quiz.created_by == actor.id)
}

/// Creates a quiz for a classroom the calling teacher is assigned to.
pub async fn create_quiz(
    store: &dyn Store,
    actor: Actor,
    req: CreateQuizRequest,
) -> Result<Quiz, AppError> {
    if actor.role != Role::Teacher {
        return Err(AppError::Forbidden(
            "Only teachers can create quizzes".to_string(),
        ));
    }
    req.validate()?;

    let title = normalize_title(&req.title)?;
    let questions = normalize_questions(req.questions)?;

    let classroom = store
        .find_classroom(req.classroom_id)
        .await?
        .ok_or(AppError::NotFound("Classroom not found".to_string()))?;
    if classroom.teacher_id != actor.id {
        return Err(AppError::Forbidden(
            "You are not assigned to this classroom".to_string(),
        ));
    }

    let quiz = store
        .create_quiz(NewQuiz {
            title,
            classroom_id: classroom.id,
            created_by: actor.id,
            questions,
        })
        .await?;

    tracing::info!(
        "Teacher {} created quiz {} with {} questions in classroom {}",
        actor.id,
        quiz.id,
        quiz.questions.len(),
        classroom.id
    );
    Ok(quiz)
}

/// Loads a quiz in the shape the caller may see: answers for admins and
/// instructors, answer-free for enrolled students.
pub async fn get_quiz(store: &dyn Store, actor: Actor, quiz_id: i64) -> Result<QuizView, AppError> {
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    match actor.role {
        Role::Admin => Ok(QuizView::Full(quiz)),
        Role::Teacher => {
            if guard::is_quiz_instructor(store, &quiz, actor.id).await? {
                Ok(QuizView::Full(quiz))
            } else {
                Err(AppError::Forbidden(
                    "You are not authorized to view this quiz".to_string(),
                ))
            }
        }
        Role::Student => {
            let enrolled = store
                .find_classroom(quiz.classroom_id)
                .await?
                .is_some_and(|c| c.is_enrolled(actor.id));
            if enrolled {
                Ok(QuizView::Public(PublicQuiz::from(&quiz)))
            } else {
                Err(AppError::Forbidden(
                    "You are not enrolled in this quiz's classroom".to_string(),
                ))
            }
        }
    }
}

pub async fn list_quizzes(store: &dyn Store, actor: Actor) -> Result<Vec<QuizView>, AppError> {
    let views = match actor.role {
        Role::Admin => store
            .list_quizzes(QuizScope::All)
            .await?
            .into_iter()
            .map(QuizView::Full)
            .collect(),
        Role::Teacher => store
            .list_quizzes(QuizScope::Teacher(actor.id))
            .await?
            .into_iter()
            .map(QuizView::Full)
            .collect(),
        Role::Student => store
            .list_quizzes(QuizScope::Student(actor.id))
            .await?
            .iter()
            .map(|q| QuizView::Public(PublicQuiz::from(q)))
            .collect(),
    };
    Ok(views)
}

/// Full replace of title and questions. Existing submissions keep their
/// snapshots and are not re-graded.
pub async fn update_quiz(
    store: &dyn Store,
    actor: Actor,
    quiz_id: i64,
    req: UpdateQuizRequest,
) -> Result<Quiz, AppError> {
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    if !can_modify(actor, &quiz) {
        return Err(AppError::Forbidden(
            "You are not authorized to edit this quiz".to_string(),
        ));
    }

    req.validate()?;
    let title = normalize_title(&req.title)?;
    let questions = normalize_questions(req.questions)?;

    let updated = store
        .replace_quiz(quiz_id, &title, questions)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    tracing::info!(
        "User {} replaced quiz {} ({} questions)",
        actor.id,
        quiz_id,
        updated.questions.len()
    );
    Ok(updated)
}

/// Deletes a quiz and every submission for it. Returns how many submissions went.
pub async fn delete_quiz(store: &dyn Store, actor: Actor, quiz_id: i64) -> Result<u64, AppError> {
    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;
    if !can_modify(actor, &quiz) {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this quiz".to_string(),
        ));
    }

    let removed = store
        .delete_quiz_cascade(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    tracing::info!(
        "User {} deleted quiz {} and {} submissions",
        actor.id,
        quiz_id,
        removed
    );
    Ok(removed)
}
