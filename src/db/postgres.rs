// src/db/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, types::Json};

use super::{
    ClassroomRepository, QuizRepository, SubmissionLedger, UserRepository, kept_question_ids,
};
use crate::{
    error::AppError,
    models::{
        classroom::{Classroom, ClassroomScope},
        question::{Question, QuestionDraft, QuestionType},
        quiz::{NewQuiz, Quiz, QuizScope},
        submission::{NewSubmission, QuizSubmissionEntry, StudentSubmissionEntry, Submission},
        user::{NewUser, User},
    },
};

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

const CLASSROOM_SELECT: &str = r#"
    SELECT
        c.id, c.name, c.code, c.teacher_id,
        ARRAY(
            SELECT cs.student_id FROM classroom_students cs
            WHERE cs.classroom_id = c.id
            ORDER BY cs.student_id
        ) AS student_ids,
        c.created_at
    FROM classrooms c
"#;

const SUBMISSION_COLUMNS: &str =
    "s.id, s.quiz_id, s.student_id, s.answers, s.score, s.total_questions, s.percentage, s.submitted_at";

/// Postgres-backed store. Uniqueness of (quiz, student) submissions is enforced
/// by the `submissions_quiz_student_key` index.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row of the 'quizzes' table, without questions.
#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    classroom_id: i64,
    created_by: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Row of the 'quiz_questions' table.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    text: String,
    #[sqlx(try_from = "String")]
    question_type: QuestionType,
    options: Json<Vec<String>>,
    answer: String,
}

impl QuizRow {
    fn into_quiz(self, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: self.id,
            title: self.title,
            classroom_id: self.classroom_id,
            created_by: self.created_by,
            questions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

async fn insert_question(
    conn: &mut PgConnection,
    quiz_id: i64,
    position: i32,
    q: &QuestionDraft,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO quiz_questions (quiz_id, position, text, question_type, options, answer)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(quiz_id)
    .bind(position)
    .bind(&q.text)
    .bind(q.question_type.as_str())
    .bind(Json(q.options.clone()))
    .bind(&q.answer)
    .execute(conn)
    .await?;
    Ok(())
}

impl PgStore {
    /// Loads questions for the given quizzes, grouped by quiz id, in display order.
    async fn load_questions(&self, quiz_ids: &[i64]) -> Result<HashMap<i64, Vec<Question>>, AppError> {
        if quiz_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT id, quiz_id, text, question_type, options, answer
            FROM quiz_questions
            WHERE quiz_id = ANY($1)
            ORDER BY quiz_id, position, id
            "#,
        )
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Question>> = HashMap::new();
        for row in rows {
            grouped.entry(row.quiz_id).or_default().push(Question {
                id: row.id,
                text: row.text,
                question_type: row.question_type,
                options: row.options.0,
                answer: row.answer,
            });
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<QuizRow>) -> Result<Vec<Quiz>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut questions = self.load_questions(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let qs = questions.remove(&row.id).unwrap_or_default();
                row.into_quiz(qs)
            })
            .collect())
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl ClassroomRepository for PgStore {
    async fn create_classroom(
        &self,
        name: &str,
        code: &str,
        teacher_id: i64,
    ) -> Result<Classroom, AppError> {
        let classroom = sqlx::query_as::<_, Classroom>(
            r#"
            INSERT INTO classrooms (name, code, teacher_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, code, teacher_id, ARRAY[]::BIGINT[] AS student_ids, created_at
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(classroom)
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<Classroom>, AppError> {
        let classroom = sqlx::query_as::<_, Classroom>(&format!("{} WHERE c.id = $1", CLASSROOM_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(classroom)
    }

    async fn list_classrooms(&self, scope: ClassroomScope) -> Result<Vec<Classroom>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(CLASSROOM_SELECT);

        match scope {
            ClassroomScope::All => {}
            ClassroomScope::TaughtBy(teacher_id) => {
                builder.push(" WHERE c.teacher_id = ");
                builder.push_bind(teacher_id);
            }
            ClassroomScope::EnrolledIn(student_id) => {
                builder.push(
                    " WHERE c.id IN (SELECT classroom_id FROM classroom_students WHERE student_id = ",
                );
                builder.push_bind(student_id);
                builder.push(")");
            }
        }
        builder.push(" ORDER BY c.created_at DESC, c.id DESC");

        let classrooms = builder
            .build_query_as::<Classroom>()
            .fetch_all(&self.pool)
            .await?;

        Ok(classrooms)
    }

    async fn assign_teacher(&self, classroom_id: i64, teacher_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE classrooms SET teacher_id = $1 WHERE id = $2")
            .bind(teacher_id)
            .bind(classroom_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn enroll_student(&self, classroom_id: i64, student_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO classroom_students (classroom_id, student_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(classroom_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl QuizRepository for PgStore {
    async fn create_quiz(&self, new_quiz: NewQuiz) -> Result<Quiz, AppError> {
        let mut tx = self.pool.begin().await?;

        let quiz_id: i64 = sqlx::query_scalar(
            "INSERT INTO quizzes (title, classroom_id, created_by) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new_quiz.title)
        .bind(new_quiz.classroom_id)
        .bind(new_quiz.created_by)
        .fetch_one(&mut *tx)
        .await?;

        for (position, q) in new_quiz.questions.iter().enumerate() {
            insert_question(&mut tx, quiz_id, position as i32, q).await?;
        }

        tx.commit().await?;

        self.find_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::InternalServerError(format!("quiz {} vanished after insert", quiz_id)))
    }

    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let row = sqlx::query_as::<_, QuizRow>(
            "SELECT id, title, classroom_id, created_by, created_at, updated_at FROM quizzes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self, scope: QuizScope) -> Result<Vec<Quiz>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, classroom_id, created_by, created_at, updated_at FROM quizzes",
        );

        match scope {
            QuizScope::All => {}
            QuizScope::Student(student_id) => {
                builder.push(
                    " WHERE classroom_id IN (SELECT classroom_id FROM classroom_students WHERE student_id = ",
                );
                builder.push_bind(student_id);
                builder.push(")");
            }
            QuizScope::Teacher(teacher_id) => {
                builder.push(" WHERE created_by = ");
                builder.push_bind(teacher_id);
                builder.push(" OR classroom_id IN (SELECT id FROM classrooms WHERE teacher_id = ");
                builder.push_bind(teacher_id);
                builder.push(")");
            }
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder.build_query_as::<QuizRow>().fetch_all(&self.pool).await?;
        self.hydrate(rows).await
    }

    async fn replace_quiz(
        &self,
        id: i64,
        title: &str,
        questions: Vec<QuestionDraft>,
    ) -> Result<Option<Quiz>, AppError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let current: Vec<i64> = sqlx::query_scalar("SELECT id FROM quiz_questions WHERE quiz_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let kept = kept_question_ids(&questions, &current);
        let kept_ids: Vec<i64> = kept.iter().flatten().copied().collect();

        sqlx::query("UPDATE quizzes SET title = $1, updated_at = NOW() WHERE id = $2")
            .bind(title)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = $1 AND id <> ALL($2)")
            .bind(id)
            .bind(&kept_ids)
            .execute(&mut *tx)
            .await?;

        for (position, (q, keep)) in questions.iter().zip(kept).enumerate() {
            match keep {
                Some(question_id) => {
                    sqlx::query(
                        r#"
                        UPDATE quiz_questions
                        SET position = $1, text = $2, question_type = $3, options = $4, answer = $5
                        WHERE id = $6
                        "#,
                    )
                    .bind(position as i32)
                    .bind(&q.text)
                    .bind(q.question_type.as_str())
                    .bind(Json(q.options.clone()))
                    .bind(&q.answer)
                    .bind(question_id)
                    .execute(&mut *tx)
                    .await?;
                }
                None => insert_question(&mut tx, id, position as i32, q).await?,
            }
        }

        tx.commit().await?;
        self.find_quiz(id).await
    }

    async fn delete_quiz_cascade(&self, id: i64) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent submission inserts until the delete commits.
        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM quizzes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM submissions WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }
}

#[async_trait]
impl SubmissionLedger for PgStore {
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, AppError> {
        let NewSubmission {
            quiz_id,
            student_id,
            result,
        } = new;

        sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (quiz_id, student_id, answers, score, total_questions, percentage)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, quiz_id, student_id, answers, score, total_questions, percentage, submitted_at
            "#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .bind(Json(result.answers))
        .bind(result.score)
        .bind(result.total_questions)
        .bind(result.percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // 23503: the quiz was deleted between the guard check and this insert.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23503") {
                    return AppError::NotFound("Quiz not found".to_string());
                }
            }
            AppError::from(e)
        })
    }

    async fn find_submission(&self, id: i64) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {} FROM submissions s WHERE s.id = $1",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn find_submission_for(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {} FROM submissions s WHERE s.quiz_id = $1 AND s.student_id = $2",
            SUBMISSION_COLUMNS
        ))
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    async fn delete_submission(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<StudentSubmissionEntry>, AppError> {
        let entries = sqlx::query_as::<_, StudentSubmissionEntry>(&format!(
            r#"
            SELECT {}, q.title AS quiz_title
            FROM submissions s
            JOIN quizzes q ON q.id = s.quiz_id
            WHERE s.student_id = $1
            ORDER BY s.submitted_at DESC, s.id DESC
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn list_by_quiz(&self, quiz_id: i64) -> Result<Vec<QuizSubmissionEntry>, AppError> {
        let entries = sqlx::query_as::<_, QuizSubmissionEntry>(&format!(
            r#"
            SELECT {}, u.name AS student_name, u.email AS student_email
            FROM submissions s
            JOIN users u ON u.id = s.student_id
            WHERE s.quiz_id = $1
            ORDER BY s.submitted_at DESC, s.id DESC
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
