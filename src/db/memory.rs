// src/db/memory.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use super::{
    ClassroomRepository, QuizRepository, SubmissionLedger, UserRepository, kept_question_ids,
};
use crate::{
    error::AppError,
    models::{
        classroom::{Classroom, ClassroomScope},
        question::{Question, QuestionDraft},
        quiz::{NewQuiz, Quiz, QuizScope},
        submission::{NewSubmission, QuizSubmissionEntry, StudentSubmissionEntry, Submission},
        user::{NewUser, User},
    },
};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    classrooms: BTreeMap<i64, Classroom>,
    quizzes: BTreeMap<i64, Quiz>,
    submissions: BTreeMap<i64, Submission>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn build_questions(&mut self, drafts: Vec<QuestionDraft>, kept: Vec<Option<i64>>) -> Vec<Question> {
        drafts
            .into_iter()
            .zip(kept)
            .map(|(d, keep)| Question {
                id: keep.unwrap_or_else(|| self.next_id()),
                text: d.text,
                question_type: d.question_type,
                options: d.options,
                answer: d.answer,
            })
            .collect()
    }
}

/// In-process store with the same contract as [`super::PgStore`].
///
/// Every mutation runs under one write lock, so the (quiz, student) uniqueness
/// check and the insert are a single step.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict(format!(
                "email '{}' is already registered",
                new_user.email
            )));
        }

        let user = User {
            id: state.next_id(),
            name: new_user.name,
            email: new_user.email,
            password: new_user.password,
            role: new_user.role,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().rev().cloned().collect())
    }
}

#[async_trait]
impl ClassroomRepository for MemoryStore {
    async fn create_classroom(
        &self,
        name: &str,
        code: &str,
        teacher_id: i64,
    ) -> Result<Classroom, AppError> {
        let mut state = self.state.write().await;

        if state.classrooms.values().any(|c| c.code == code) {
            return Err(AppError::Conflict(format!("classroom code '{}' is taken", code)));
        }

        let classroom = Classroom {
            id: state.next_id(),
            name: name.to_string(),
            code: code.to_string(),
            teacher_id,
            student_ids: Vec::new(),
            created_at: Utc::now(),
        };
        state.classrooms.insert(classroom.id, classroom.clone());
        Ok(classroom)
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, AppError> {
        Ok(self.state.read().await.classrooms.get(&id).cloned())
    }

    async fn list_classrooms(&self, scope: ClassroomScope) -> Result<Vec<Classroom>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .classrooms
            .values()
            .rev()
            .filter(|c| match scope {
                ClassroomScope::All => true,
                ClassroomScope::TaughtBy(teacher_id) => c.teacher_id == teacher_id,
                ClassroomScope::EnrolledIn(student_id) => c.is_enrolled(student_id),
            })
            .cloned()
            .collect())
    }

    async fn assign_teacher(&self, classroom_id: i64, teacher_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.classrooms.get_mut(&classroom_id) {
            Some(classroom) => {
                classroom.teacher_id = teacher_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn enroll_student(&self, classroom_id: i64, student_id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let classroom = state
            .classrooms
            .get_mut(&classroom_id)
            .ok_or(AppError::NotFound("Classroom not found".to_string()))?;

        if classroom.is_enrolled(student_id) {
            return Ok(false);
        }
        classroom.student_ids.push(student_id);
        classroom.student_ids.sort_unstable();
        Ok(true)
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn create_quiz(&self, new_quiz: NewQuiz) -> Result<Quiz, AppError> {
        let mut state = self.state.write().await;

        let id = state.next_id();
        let kept = vec![None; new_quiz.questions.len()];
        let questions = state.build_questions(new_quiz.questions, kept);
        let now = Utc::now();

        let quiz = Quiz {
            id,
            title: new_quiz.title,
            classroom_id: new_quiz.classroom_id,
            created_by: new_quiz.created_by,
            questions,
            created_at: now,
            updated_at: now,
        };
        state.quizzes.insert(id, quiz.clone());
        Ok(quiz)
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.state.read().await.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, scope: QuizScope) -> Result<Vec<Quiz>, AppError> {
        let state = self.state.read().await;

        Ok(state
            .quizzes
            .values()
            .rev()
            .filter(|q| {
                let classroom = state.classrooms.get(&q.classroom_id);
                match scope {
                    QuizScope::All => true,
                    QuizScope::Student(student_id) => {
                        classroom.is_some_and(|c| c.is_enrolled(student_id))
                    }
                    QuizScope::Teacher(teacher_id) => {
                        q.created_by == teacher_id
                            || classroom.is_some_and(|c| c.teacher_id == teacher_id)
                    }
                }
            })
            .cloned()
            .collect())
    }

    async fn replace_quiz(
        &self,
        id: i64,
        title: &str,
        questions: Vec<QuestionDraft>,
    ) -> Result<Option<Quiz>, AppError> {
        let mut state = self.state.write().await;

        let Some(current) = state.quizzes.get(&id) else {
            return Ok(None);
        };
        let current_ids: Vec<i64> = current.questions.iter().map(|q| q.id).collect();
        let kept = kept_question_ids(&questions, &current_ids);
        let rebuilt = state.build_questions(questions, kept);

        let Some(quiz) = state.quizzes.get_mut(&id) else {
            return Ok(None);
        };
        quiz.title = title.to_string();
        quiz.questions = rebuilt;
        quiz.updated_at = Utc::now();
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz_cascade(&self, id: i64) -> Result<Option<u64>, AppError> {
        let mut state = self.state.write().await;

        if state.quizzes.remove(&id).is_none() {
            return Ok(None);
        }
        let before = state.submissions.len();
        state.submissions.retain(|_, s| s.quiz_id != id);
        Ok(Some((before - state.submissions.len()) as u64))
    }
}

#[async_trait]
impl SubmissionLedger for MemoryStore {
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, AppError> {
        let mut state = self.state.write().await;

        if !state.quizzes.contains_key(&new.quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        if state
            .submissions
            .values()
            .any(|s| s.quiz_id == new.quiz_id && s.student_id == new.student_id)
        {
            return Err(AppError::Conflict(format!(
                "submission for quiz {} by student {} already exists",
                new.quiz_id, new.student_id
            )));
        }

        let submission = Submission {
            id: state.next_id(),
            quiz_id: new.quiz_id,
            student_id: new.student_id,
            answers: Json(new.result.answers),
            score: new.result.score,
            total_questions: new.result.total_questions,
            percentage: new.result.percentage,
            submitted_at: Utc::now(),
        };
        state.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        Ok(self.state.read().await.submissions.get(&id).cloned())
    }

    async fn find_submission_for(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .submissions
            .values()
            .find(|s| s.quiz_id == quiz_id && s.student_id == student_id)
            .cloned())
    }

    async fn delete_submission(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.state.write().await.submissions.remove(&id).is_some())
    }

    async fn list_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<StudentSubmissionEntry>, AppError> {
        let state = self.state.read().await;
        let mut entries: Vec<StudentSubmissionEntry> = state
            .submissions
            .values()
            .filter(|s| s.student_id == student_id)
            .filter_map(|s| {
                let quiz = state.quizzes.get(&s.quiz_id)?;
                Some(StudentSubmissionEntry {
                    submission: s.clone(),
                    quiz_title: quiz.title.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            (b.submission.submitted_at, b.submission.id).cmp(&(a.submission.submitted_at, a.submission.id))
        });
        Ok(entries)
    }

    async fn list_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizSubmissionEntry>, AppError> {
        let state = self.state.read().await;
        let mut entries: Vec<QuizSubmissionEntry> = state
            .submissions
            .values()
            .filter(|s| s.quiz_id == quiz_id)
            .filter_map(|s| {
                let student = state.users.get(&s.student_id)?;
                Some(QuizSubmissionEntry {
                    submission: s.clone(),
                    student_name: student.name.clone(),
                    student_email: student.email.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            (b.submission.submitted_at, b.submission.id).cmp(&(a.submission.submitted_at, a.submission.id))
        });
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::GradingResult;

    fn result(score: i32) -> GradingResult {
        GradingResult {
            answers: Vec::new(),
            score,
            total_questions: 2,
            percentage: crate::grading::percentage(score, 2),
        }
    }

    async fn store_with_quiz() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let quiz = store
            .create_quiz(NewQuiz {
                title: "Quiz".to_string(),
                classroom_id: 1,
                created_by: 1,
                questions: Vec::new(),
            })
            .await
            .unwrap();
        (store, quiz.id)
    }

    #[tokio::test]
    async fn second_insert_for_same_pair_conflicts() {
        let (store, quiz_id) = store_with_quiz().await;
        let new = |score| NewSubmission {
            quiz_id,
            student_id: 7,
            result: result(score),
        };

        store.create_submission(new(1)).await.unwrap();
        let err = store.create_submission(new(2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.find_submission_for(quiz_id, 7).await.unwrap().unwrap();
        assert_eq!(stored.score, 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_admit_exactly_one() {
        let (store, quiz_id) = store_with_quiz().await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_submission(NewSubmission {
                            quiz_id,
                            student_id: 7,
                            result: result(i % 3),
                        })
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn insert_for_missing_quiz_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .create_submission(NewSubmission {
                quiz_id: 99,
                student_id: 1,
                result: result(0),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let (store, quiz_id) = store_with_quiz().await;
        let s = store
            .create_submission(NewSubmission {
                quiz_id,
                student_id: 3,
                result: result(2),
            })
            .await
            .unwrap();

        assert!(store.delete_submission(s.id).await.unwrap());
        assert!(!store.delete_submission(s.id).await.unwrap());
    }
}
