// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use eduquiz::{
    config::Config,
    db::{ClassroomRepository, MemoryStore, UserRepository},
    models::user::{NewUser, Role},
    routes,
    state::AppState,
    utils::{hash::hash_password, jwt::sign_jwt},
};
use serde_json::{Value, json};

pub const TEST_PASSWORD: &str = "correct horse";

pub fn test_config() -> Config {
    Config {
        database_url: "memory".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        admin_email: None,
        admin_password: None,
    }
}

pub fn test_state(store: MemoryStore) -> AppState {
    AppState {
        store: Arc::new(store),
        config: test_config(),
    }
}

pub struct TestApp {
    pub address: String,
    pub store: MemoryStore,
    pub client: reqwest::Client,
}

/// A seeded account and a bearer token for it.
#[derive(Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = MemoryStore::new();
    let app = routes::create_router(test_state(store.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

pub fn token_for(id: i64, role: Role) -> String {
    let config = test_config();
    sign_jwt(id, role, &config.jwt_secret, config.jwt_expiration).unwrap()
}

pub async fn seed_user(store: &MemoryStore, name: &str, role: Role) -> TestUser {
    let email = format!("{}@school.test", name);
    let user = store
        .create_user(NewUser {
            name: name.to_string(),
            email: email.clone(),
            password: hash_password(TEST_PASSWORD).unwrap(),
            role,
        })
        .await
        .unwrap();

    TestUser {
        id: user.id,
        email,
        token: token_for(user.id, role),
    }
}

pub async fn seed_classroom(store: &MemoryStore, teacher: &TestUser, students: &[&TestUser]) -> i64 {
    let classroom = store
        .create_classroom("Physics 101", &format!("CODE{}", teacher.id), teacher.id)
        .await
        .unwrap();
    for student in students {
        store.enroll_student(classroom.id, student.id).await.unwrap();
    }
    classroom.id
}

/// Two questions: "2+2?" (answer "4") and "The sky is blue" (answer "True").
pub fn quiz_body(classroom_id: i64) -> Value {
    json!({
        "title": "Warm-up",
        "classroomId": classroom_id,
        "questions": [
            {
                "text": "2+2?",
                "questionType": "multiple-choice",
                "options": ["3", "4", "5"],
                "answer": "4"
            },
            {
                "text": "The sky is blue",
                "questionType": "true-false",
                "options": ["True", "False"],
                "answer": "True"
            }
        ]
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates a quiz through the API and returns its JSON.
    pub async fn create_quiz(&self, teacher: &TestUser, classroom_id: i64) -> Value {
        let response = self
            .client
            .post(self.url("/api/quizzes"))
            .bearer_auth(&teacher.token)
            .json(&quiz_body(classroom_id))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn submit(&self, student: &TestUser, quiz_id: i64, answers: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quizzes/{}/submit", quiz_id)))
            .bearer_auth(&student.token)
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Teacher, one enrolled student, one outsider, and a two-question quiz.
pub struct Classroom {
    pub app: TestApp,
    pub admin: TestUser,
    pub teacher: TestUser,
    pub student: TestUser,
    pub outsider: TestUser,
    pub classroom_id: i64,
    pub quiz_id: i64,
    pub question_ids: Vec<i64>,
}

pub async fn classroom_with_quiz() -> Classroom {
    let app = spawn_app().await;
    let admin = seed_user(&app.store, "admin", Role::Admin).await;
    let teacher = seed_user(&app.store, "teacher", Role::Teacher).await;
    let student = seed_user(&app.store, "student", Role::Student).await;
    let outsider = seed_user(&app.store, "outsider", Role::Student).await;
    let classroom_id = seed_classroom(&app.store, &teacher, &[&student]).await;

    let quiz = app.create_quiz(&teacher, classroom_id).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    let question_ids = quiz["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();

    Classroom {
        app,
        admin,
        teacher,
        student,
        outsider,
        classroom_id,
        quiz_id,
        question_ids,
    }
}
