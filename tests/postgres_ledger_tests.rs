// tests/postgres_ledger_tests.rs

//! Ledger behaviour against a real database.
//! Runs only when DATABASE_URL is set; otherwise each test returns early.

use std::sync::Arc;

use eduquiz::{
    db::{ClassroomRepository, PgStore, QuizRepository, SubmissionLedger, UserRepository},
    error::AppError,
    models::{
        question::{QuestionDraft, QuestionType},
        quiz::{NewQuiz, Quiz},
        submission::{GradedAnswer, GradingResult, NewSubmission},
        user::{NewUser, Role},
    },
};
use sqlx::postgres::PgPoolOptions;

async fn store() -> Option<PgStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres ledger test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(PgStore::new(pool))
}

async fn user(store: &PgStore, role: Role) -> i64 {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    store
        .create_user(NewUser {
            name: format!("{} {}", role, &tag[..6]),
            email: format!("{}@ledger.test", tag),
            password: "not-a-real-hash".to_string(),
            role,
        })
        .await
        .unwrap()
        .id
}

fn draft(id: Option<i64>, text: &str) -> QuestionDraft {
    QuestionDraft {
        id,
        text: text.to_string(),
        question_type: QuestionType::TrueFalse,
        options: vec!["True".to_string(), "False".to_string()],
        answer: "True".to_string(),
    }
}

struct Fixture {
    classroom_id: i64,
    teacher: i64,
    student: i64,
    quiz_id: i64,
}

impl Fixture {
    async fn add_quiz(&self, store: &PgStore, title: &str) -> Quiz {
        store
            .create_quiz(NewQuiz {
                title: title.to_string(),
                classroom_id: self.classroom_id,
                created_by: self.teacher,
                questions: vec![draft(None, "Water is wet")],
            })
            .await
            .unwrap()
    }
}

/// A classroom with one enrolled student and a one-question quiz.
async fn quiz_fixture(store: &PgStore) -> Fixture {
    let teacher = user(store, Role::Teacher).await;
    let student = user(store, Role::Student).await;
    let code = uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    let classroom = store
        .create_classroom("Ledger", &code, teacher)
        .await
        .unwrap();
    store.enroll_student(classroom.id, student).await.unwrap();

    let mut fixture = Fixture {
        classroom_id: classroom.id,
        teacher,
        student,
        quiz_id: 0,
    };
    fixture.quiz_id = fixture.add_quiz(store, "Ledger quiz").await.id;
    fixture
}

fn attempt(quiz_id: i64, student_id: i64) -> NewSubmission {
    NewSubmission {
        quiz_id,
        student_id,
        result: GradingResult {
            answers: Vec::new(),
            score: 0,
            total_questions: 1,
            percentage: 0.0,
        },
    }
}

fn correct_attempt(quiz: &Quiz, student_id: i64) -> NewSubmission {
    let question = &quiz.questions[0];
    NewSubmission {
        quiz_id: quiz.id,
        student_id,
        result: GradingResult {
            answers: vec![GradedAnswer {
                question_id: question.id,
                question_text: question.text.clone(),
                selected_option: "True".to_string(),
                correct_answer: question.answer.clone(),
                is_correct: true,
            }],
            score: 1,
            total_questions: 1,
            percentage: 100.0,
        },
    }
}

#[tokio::test]
async fn unique_index_admits_one_concurrent_insert() {
    let Some(store) = store().await else { return };
    let store = Arc::new(store);
    let Fixture { quiz_id, student, .. } = quiz_fixture(&store).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_submission(attempt(quiz_id, student)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn cascade_delete_reports_and_removes_submissions() {
    let Some(store) = store().await else { return };
    let Fixture { quiz_id, student, .. } = quiz_fixture(&store).await;

    let submission = store.create_submission(attempt(quiz_id, student)).await.unwrap();

    assert_eq!(store.delete_quiz_cascade(quiz_id).await.unwrap(), Some(1));
    assert!(store.find_quiz(quiz_id).await.unwrap().is_none());
    assert!(store.find_submission(submission.id).await.unwrap().is_none());
    assert_eq!(store.delete_quiz_cascade(quiz_id).await.unwrap(), None);
}

#[tokio::test]
async fn insert_for_missing_quiz_is_not_found() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;

    let err = store
        .create_submission(attempt(i64::MAX, student))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn student_history_joins_titles_newest_first() {
    let Some(store) = store().await else { return };
    let fixture = quiz_fixture(&store).await;
    let first = store.find_quiz(fixture.quiz_id).await.unwrap().unwrap();
    let second = fixture.add_quiz(&store, "Second quiz").await;

    let older = store
        .create_submission(correct_attempt(&first, fixture.student))
        .await
        .unwrap();
    let newer = store
        .create_submission(attempt(second.id, fixture.student))
        .await
        .unwrap();

    let history = store.list_by_student(fixture.student).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].submission.id, newer.id);
    assert_eq!(history[0].quiz_title, "Second quiz");
    assert_eq!(history[1].submission.id, older.id);
    assert_eq!(history[1].quiz_title, "Ledger quiz");
    assert_eq!(history[1].submission.score, 1);
    assert_eq!(history[1].submission.answers.0.len(), 1);
    assert!(history[1].submission.answers.0[0].is_correct);
    assert_eq!(history[1].submission.answers.0[0].question_id, first.questions[0].id);
}

#[tokio::test]
async fn quiz_roster_joins_student_details_newest_first() {
    let Some(store) = store().await else { return };
    let fixture = quiz_fixture(&store).await;
    let quiz = store.find_quiz(fixture.quiz_id).await.unwrap().unwrap();
    let late = user(&store, Role::Student).await;

    let early_entry = store
        .create_submission(correct_attempt(&quiz, fixture.student))
        .await
        .unwrap();
    let late_entry = store
        .create_submission(attempt(quiz.id, late))
        .await
        .unwrap();

    let roster = store.list_by_quiz(quiz.id).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].submission.id, late_entry.id);
    assert_eq!(roster[1].submission.id, early_entry.id);

    for (entry, student_id) in [(&roster[0], late), (&roster[1], fixture.student)] {
        let student = store.find_user(student_id).await.unwrap().unwrap();
        assert_eq!(entry.submission.student_id, student_id);
        assert_eq!(entry.student_name, student.name);
        assert_eq!(entry.student_email, student.email);
    }
    assert_eq!(roster[1].submission.percentage, 100.0);
    assert!(store.list_by_quiz(i64::MAX).await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_quiz_keeps_resent_question_ids() {
    let Some(store) = store().await else { return };
    let fixture = quiz_fixture(&store).await;
    let quiz = store
        .create_quiz(NewQuiz {
            title: "Before".to_string(),
            classroom_id: fixture.classroom_id,
            created_by: fixture.teacher,
            questions: vec![draft(None, "One"), draft(None, "Two")],
        })
        .await
        .unwrap();
    let (one, two) = (quiz.questions[0].id, quiz.questions[1].id);

    let updated = store
        .replace_quiz(
            quiz.id,
            "After",
            vec![
                draft(Some(two), "Two, reworded"),
                draft(None, "Three"),
                draft(Some(i64::MAX), "Foreign id"),
            ],
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "After");
    assert_eq!(updated.questions.len(), 3);
    assert_eq!(updated.questions[0].id, two);
    assert_eq!(updated.questions[0].text, "Two, reworded");
    let fresh: Vec<i64> = updated.questions[1..].iter().map(|q| q.id).collect();
    assert!(fresh.iter().all(|id| *id != one && *id != two && *id != i64::MAX));
    assert_ne!(fresh[0], fresh[1]);

    let reloaded = store.find_quiz(quiz.id).await.unwrap().unwrap();
    let ids: Vec<i64> = reloaded.questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, updated.questions.iter().map(|q| q.id).collect::<Vec<_>>());

    assert!(
        store
            .replace_quiz(i64::MAX, "Missing", vec![draft(None, "Q")])
            .await
            .unwrap()
            .is_none()
    );
}
