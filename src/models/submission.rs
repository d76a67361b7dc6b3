// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Represents the 'submissions' table: one grading record per (quiz, student).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,

    /// Frozen per-question results, stored as a JSON array.
    pub answers: Json<Vec<GradedAnswer>>,

    /// Number of correct answers.
    pub score: i32,

    /// Question count of the quiz at submission time.
    pub total_questions: i32,

    /// `score / total_questions * 100`, rounded to two decimals.
    pub percentage: f64,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// One graded answer with snapshots of the question text and canonical answer,
/// so later quiz edits do not change how a past result reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_id: i64,
    pub question_text: String,
    pub selected_option: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Output of the grading engine, before it is written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingResult {
    pub answers: Vec<GradedAnswer>,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
}

/// Insert payload for the ledger.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub quiz_id: i64,
    pub student_id: i64,
    pub result: GradingResult,
}

/// Reference to a question as sent by a client.
///
/// Clients may send ids as numbers or strings; anything that does not resolve
/// to a question of the quiz is ignored during grading. Values of any other
/// JSON type (null, fractions, objects) land in `Other` and never resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionRef {
    Id(i64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for QuestionRef {
    fn default() -> Self {
        QuestionRef::Other(serde_json::Value::Null)
    }
}

impl QuestionRef {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            QuestionRef::Id(id) => Some(*id),
            QuestionRef::Text(raw) => raw.trim().parse().ok(),
            QuestionRef::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    #[serde(default)]
    pub question_id: QuestionRef,
    pub selected_option: String,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<SubmittedAnswer>,
}

/// Response body for a stored submission; also the payload of the
/// "already submitted" rejection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: i64,
    pub quiz_id: i64,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
    pub answers: Vec<GradedAnswer>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl From<Submission> for SubmissionReceipt {
    fn from(s: Submission) -> Self {
        Self {
            submission_id: s.id,
            quiz_id: s.quiz_id,
            score: s.score,
            total_questions: s.total_questions,
            percentage: s.percentage,
            answers: s.answers.0,
            submitted_at: s.submitted_at,
        }
    }
}

/// A student's history row, joined with the quiz title.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmissionEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub quiz_title: String,
}

/// A teacher's view row, joined with the student's name and email.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmissionEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub submission: Submission,
    pub student_name: String,
    pub student_email: String,
}
