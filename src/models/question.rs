// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::html::clean_html;

/// Question kind. Stored as text in `quiz_questions.question_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[default]
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "true-false")]
    TrueFalse,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for QuestionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "true-false" => Ok(QuestionType::TrueFalse),
            _ => Err(format!("unknown question type '{}'", value)),
        }
    }
}

/// A saved question of a quiz.
/// `id` is assigned once on insert and kept across quiz edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// The prompt shown to students.
    pub text: String,

    pub question_type: QuestionType,

    /// Non-empty, trimmed options in display order.
    pub options: Vec<String>,

    /// The canonical answer. Always one of `options`.
    pub answer: String,
}

/// DTO for sending question to students (excludes answer).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            text: q.text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
        }
    }
}

/// DTO for one question inside a create/update quiz request.
///
/// `id` is optional: resending an existing question's id on update keeps it,
/// anything else is stored as a new question.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub id: Option<i64>,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
}

/// A question that passed normalization and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub id: Option<i64>,
    pub text: String,
    pub question_type: QuestionType,
    pub options: Vec<String>,
    pub answer: String,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    if options.len() > 20 {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

impl QuestionInput {
    /// Trims and checks the question against the authoring rules:
    /// multiple-choice needs at least 2 non-empty options, true-false exactly 2,
    /// and the answer must be one of the non-empty options (case-sensitive).
    pub fn normalize(self) -> Result<QuestionDraft, String> {
        let text = clean_html(self.text.trim());
        if text.trim().is_empty() {
            return Err("question text is required".to_string());
        }

        let options: Vec<String> = self
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        match self.question_type {
            QuestionType::MultipleChoice if options.len() < 2 => {
                return Err(
                    "multiple-choice questions need at least 2 non-empty options".to_string(),
                );
            }
            QuestionType::TrueFalse if options.len() != 2 => {
                return Err("true-false questions need exactly 2 non-empty options".to_string());
            }
            _ => {}
        }

        let answer = self.answer.trim().to_string();
        if !options.contains(&answer) {
            return Err(format!("answer '{}' is not one of the options", answer));
        }

        Ok(QuestionDraft {
            id: self.id,
            text,
            question_type: self.question_type,
            options,
            answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(question_type: QuestionType, options: &[&str], answer: &str) -> QuestionInput {
        QuestionInput {
            id: None,
            text: "  Pick one  ".to_string(),
            question_type,
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn normalize_trims_and_drops_empty_options() {
        let draft = input(QuestionType::MultipleChoice, &[" A ", "", "B", "   "], " B ")
            .normalize()
            .unwrap();
        assert_eq!(draft.text, "Pick one");
        assert_eq!(draft.options, vec!["A", "B"]);
        assert_eq!(draft.answer, "B");
    }

    #[test]
    fn multiple_choice_needs_two_non_empty_options() {
        let err = input(QuestionType::MultipleChoice, &["A", " "], "A")
            .normalize()
            .unwrap_err();
        assert!(err.contains("at least 2"));
    }

    #[test]
    fn true_false_needs_exactly_two_options() {
        assert!(input(QuestionType::TrueFalse, &["True", "False"], "True")
            .normalize()
            .is_ok());
        assert!(input(QuestionType::TrueFalse, &["True", "False", "Maybe"], "True")
            .normalize()
            .is_err());
    }

    #[test]
    fn answer_must_match_an_option_case_sensitively() {
        let err = input(QuestionType::MultipleChoice, &["Paris", "Rome"], "paris")
            .normalize()
            .unwrap_err();
        assert!(err.contains("not one of the options"));
    }

    #[test]
    fn answer_cannot_point_at_a_dropped_empty_option() {
        assert!(input(QuestionType::MultipleChoice, &["A", "B", " "], " ")
            .normalize()
            .is_err());
    }

    #[test]
    fn question_type_round_trips_through_text() {
        for t in [QuestionType::MultipleChoice, QuestionType::TrueFalse] {
            assert_eq!(QuestionType::try_from(t.as_str().to_string()), Ok(t));
        }
        assert!(QuestionType::try_from("essay".to_string()).is_err());
    }
}
