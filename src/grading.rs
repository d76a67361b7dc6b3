// src/grading.rs

use std::collections::{HashMap, HashSet};

use crate::models::{
    question::Question,
    submission::{GradedAnswer, GradingResult, SubmittedAnswer},
};

/// Rounds to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of correct answers, 0 for an empty quiz.
pub fn percentage(score: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    round2(score as f64 / total_questions as f64 * 100.0)
}

/// Grades a submission against the quiz's questions.
///
/// * Answers whose id does not match a question are dropped entirely.
/// * A question is graded once; later answers for the same id are ignored.
/// * Correctness is exact string equality with the canonical answer.
/// * The denominator is the quiz's question count, so unanswered questions
///   count as wrong.
///
/// Output answers keep submission order.
pub fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradingResult {
    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::new();
    let mut answers = Vec::with_capacity(submitted.len().min(questions.len()));

    for entry in submitted {
        let Some(question) = entry.question_id.as_id().and_then(|id| by_id.get(&id)) else {
            continue;
        };
        if !seen.insert(question.id) {
            continue;
        }

        answers.push(GradedAnswer {
            question_id: question.id,
            question_text: question.text.clone(),
            selected_option: entry.selected_option.clone(),
            correct_answer: question.answer.clone(),
            is_correct: question.answer == entry.selected_option,
        });
    }

    let score = answers.iter().filter(|a| a.is_correct).count() as i32;
    let total_questions = questions.len() as i32;

    GradingResult {
        answers,
        score,
        total_questions,
        percentage: percentage(score, total_questions),
    }
}
