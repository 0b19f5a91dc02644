/// Quiz-suite endpoints. Suites are owner-scoped collections of quizzes;
/// reading a suite includes its linked quizzes. Membership mutation is not
/// exposed here.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::AppError;
use crate::routes::quizzes::QuizRecord;
use crate::validators::is_valid_text;

#[derive(Deserialize)]
pub struct CreateQuizSuiteRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateQuizSuiteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct QuizSuiteRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct QuizSuiteResponse {
    #[serde(flatten)]
    pub suite: QuizSuiteRecord,
    pub quizzes: Vec<QuizRecord>,
}

/// POST /api/quiz-suites
pub async fn create_quiz_suite(
    form: web::Json<CreateQuizSuiteRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id;
    let title = is_valid_text("title", &form.title)?;
    let description = match &form.description {
        Some(description) => Some(is_valid_text("description", description)?),
        None => None,
    };

    let suite = sqlx::query_as::<_, QuizSuiteRecord>(
        r#"
        INSERT INTO quiz_suites (title, description, created_by)
        VALUES ($1, $2, $3)
        RETURNING id, title, description, created_by, created_at, updated_at
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(user_id = user_id, quiz_suite_id = suite.id, "Quiz suite created");

    Ok(HttpResponse::Created().json(suite))
}

/// GET /api/quiz-suites — the caller's suites.
pub async fn get_quiz_suites(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id;

    let suites = sqlx::query_as::<_, QuizSuiteRecord>(
        r#"
        SELECT id, title, description, created_by, created_at, updated_at
        FROM quiz_suites
        WHERE created_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(suites))
}

/// GET /api/quiz-suites/{id} — one suite with its quizzes.
pub async fn get_quiz_suite(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let suite_id = path.into_inner();

    let suite = sqlx::query_as::<_, QuizSuiteRecord>(
        r#"
        SELECT id, title, description, created_by, created_at, updated_at
        FROM quiz_suites
        WHERE id = $1
        "#,
    )
    .bind(suite_id)
    .fetch_one(pool.get_ref())
    .await?;

    let quizzes = sqlx::query_as::<_, QuizRecord>(
        r#"
        SELECT q.id, q.question, q.quiz_type, q.created_by, q.created_at, q.updated_at
        FROM quizzes q
        JOIN quiz_suite_quizzes j ON j.quiz_id = q.id
        WHERE j.quiz_suite_id = $1
        ORDER BY q.id
        "#,
    )
    .bind(suite_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(QuizSuiteResponse { suite, quizzes }))
}

/// PUT /api/quiz-suites/{id}
pub async fn update_quiz_suite(
    path: web::Path<i64>,
    form: web::Json<UpdateQuizSuiteRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let suite_id = path.into_inner();
    let user_id = claims.user_id;

    let title = match &form.title {
        Some(title) => Some(is_valid_text("title", title)?),
        None => None,
    };
    let description = match &form.description {
        Some(description) => Some(is_valid_text("description", description)?),
        None => None,
    };

    let suite = sqlx::query_as::<_, QuizSuiteRecord>(
        r#"
        UPDATE quiz_suites
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            updated_at = now()
        WHERE id = $3 AND created_by = $4
        RETURNING id, title, description, created_by, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(suite_id)
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(suite))
}

/// DELETE /api/quiz-suites/{id}
pub async fn delete_quiz_suite(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let suite_id = path.into_inner();
    let user_id = claims.user_id;

    let result = sqlx::query("DELETE FROM quiz_suites WHERE id = $1 AND created_by = $2")
        .bind(suite_id)
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound.into());
    }

    tracing::info!(user_id = user_id, quiz_suite_id = suite_id, "Quiz suite deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "quiz suite deleted successfully"
    })))
}
