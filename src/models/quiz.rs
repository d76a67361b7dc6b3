// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{PublicQuestion, Question, QuestionDraft, QuestionInput},
    utils::html::clean_html,
};

/// A quiz with its question bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    /// Owning classroom; the authorization boundary for students.
    pub classroom_id: i64,
    /// The teacher who owns grading rights by default.
    pub created_by: i64,
    pub questions: Vec<Question>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Student-facing quiz, answers stripped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub classroom_id: i64,
    pub created_by: i64,
    pub questions: Vec<PublicQuestion>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Quiz> for PublicQuiz {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            classroom_id: quiz.classroom_id,
            created_by: quiz.created_by,
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
            created_at: quiz.created_at,
        }
    }
}

/// What a caller is allowed to see of a quiz.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QuizView {
    Full(Quiz),
    Public(PublicQuiz),
}

/// Which quizzes a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizScope {
    All,
    /// Quizzes of every classroom the student is enrolled in.
    Student(i64),
    /// Quizzes the teacher created or that belong to a classroom they teach.
    Teacher(i64),
}

/// Insert payload for a quiz and its questions.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub classroom_id: i64,
    pub created_by: i64,
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub classroom_id: i64,
    #[validate(length(min = 1, max = 200, message = "A quiz needs at least one question."))]
    pub questions: Vec<QuestionInput>,
}

/// Full replace of title and question set.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "A quiz needs at least one question."))]
    pub questions: Vec<QuestionInput>,
}

pub fn normalize_title(title: &str) -> Result<String, AppError> {
    let cleaned = clean_html(title.trim());
    if cleaned.trim().is_empty() {
        return Err(AppError::BadRequest("Quiz title is required".to_string()));
    }
    Ok(cleaned)
}

/// Validates and normalizes every question, reporting the first offender by position.
pub fn normalize_questions(inputs: Vec<QuestionInput>) -> Result<Vec<QuestionDraft>, AppError> {
    if inputs.is_empty() {
        return Err(AppError::BadRequest(
            "A quiz needs at least one question.".to_string(),
        ));
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            q.validate()
                .map_err(|e| AppError::BadRequest(format!("Question {}: {}", i + 1, e)))?;
            q.normalize()
                .map_err(|msg| AppError::BadRequest(format!("Question {}: {}", i + 1, msg)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionType;

    fn question(text: &str, options: &[&str], answer: &str) -> QuestionInput {
        QuestionInput {
            id: None,
            text: text.to_string(),
            question_type: QuestionType::MultipleChoice,
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn rejects_empty_question_list() {
        assert!(matches!(
            normalize_questions(vec![]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn request_question_count_is_bounded() {
        let request = |count: usize| CreateQuizRequest {
            title: "Week 1".to_string(),
            classroom_id: 1,
            questions: (0..count).map(|_| question("Q", &["A", "B"], "A")).collect(),
        };

        assert!(request(0).validate().is_err());
        assert!(request(1).validate().is_ok());
        assert!(request(200).validate().is_ok());
        assert!(request(201).validate().is_err());

        let update = UpdateQuizRequest {
            title: "Week 1".to_string(),
            questions: Vec::new(),
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn reports_offending_question_position() {
        let err = normalize_questions(vec![
            question("Q1", &["A", "B"], "A"),
            question("Q2", &["A", "B"], "C"),
        ])
        .unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert!(msg.starts_with("Question 2")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn title_is_trimmed_and_sanitized() {
        assert_eq!(normalize_title("  Week 1  ").unwrap(), "Week 1");
        assert_eq!(
            normalize_title("Quiz<script>alert(1)</script>").unwrap(),
            "Quiz"
        );
        assert!(normalize_title("   ").is_err());
    }

    #[test]
    fn public_quiz_hides_answers() {
        let quiz = Quiz {
            id: 1,
            title: "T".to_string(),
            classroom_id: 2,
            created_by: 3,
            questions: vec![Question {
                id: 10,
                text: "Q".to_string(),
                question_type: QuestionType::TrueFalse,
                options: vec!["True".to_string(), "False".to_string()],
                answer: "True".to_string(),
            }],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let json = serde_json::to_value(QuizView::Public(PublicQuiz::from(&quiz))).unwrap();
        assert!(json["questions"][0].get("answer").is_none());
        assert_eq!(json["questions"][0]["questionType"], "true-false");
    }
}
