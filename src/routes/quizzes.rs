/// Quiz endpoints: quiz CRUD plus selection management. Every operation is
/// scoped to the authenticated creator.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::Claims;
use crate::error::{AppError, ValidationError};
use crate::validators::is_valid_text;

const QUIZ_TYPES: [&str; 3] = ["single_choice", "multi_choice", "true_false"];

#[derive(Deserialize)]
pub struct CreateQuizRequest {
    pub question: String,
    pub quiz_type: String,
    #[serde(default)]
    pub selections: Vec<SelectionInput>,
}

#[derive(Deserialize)]
pub struct UpdateQuizRequest {
    pub question: Option<String>,
    pub quiz_type: Option<String>,
}

#[derive(Deserialize)]
pub struct SelectionInput {
    pub selection_text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct QuizRecord {
    pub id: i64,
    pub question: String,
    pub quiz_type: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct SelectionRecord {
    pub id: i64,
    pub quiz_id: i64,
    pub selection_text: String,
    pub is_correct: bool,
}

#[derive(Serialize)]
pub struct QuizResponse {
    #[serde(flatten)]
    pub quiz: QuizRecord,
    pub selections: Vec<SelectionRecord>,
}

fn validate_quiz_type(quiz_type: &str) -> Result<String, AppError> {
    if QUIZ_TYPES.contains(&quiz_type) {
        Ok(quiz_type.to_string())
    } else {
        Err(ValidationError::InvalidFormat(format!(
            "quiz_type must be one of: {}",
            QUIZ_TYPES.join(", ")
        ))
        .into())
    }
}

async fn load_selections(pool: &PgPool, quiz_id: i64) -> Result<Vec<SelectionRecord>, AppError> {
    let selections = sqlx::query_as::<_, SelectionRecord>(
        "SELECT id, quiz_id, selection_text, is_correct FROM quiz_selections WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(selections)
}

/// POST /api/quizzes
pub async fn create_quiz(
    form: web::Json<CreateQuizRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id;
    let question = is_valid_text("question", &form.question)?;
    let quiz_type = validate_quiz_type(&form.quiz_type)?;

    // Validate every selection before writing anything; a bad selection
    // must not leave a partially created quiz behind.
    let mut validated = Vec::with_capacity(form.selections.len());
    for selection in &form.selections {
        let text = is_valid_text("selection_text", &selection.selection_text)?;
        validated.push((text, selection.is_correct));
    }

    let mut tx = pool.begin().await?;

    let quiz = sqlx::query_as::<_, QuizRecord>(
        r#"
        INSERT INTO quizzes (question, quiz_type, created_by)
        VALUES ($1, $2, $3)
        RETURNING id, question, quiz_type, created_by, created_at, updated_at
        "#,
    )
    .bind(&question)
    .bind(&quiz_type)
    .bind(user_id)
    .fetch_one(&mut tx)
    .await?;

    for (text, is_correct) in &validated {
        sqlx::query(
            "INSERT INTO quiz_selections (quiz_id, selection_text, is_correct) VALUES ($1, $2, $3)",
        )
        .bind(quiz.id)
        .bind(text)
        .bind(is_correct)
        .execute(&mut tx)
        .await?;
    }

    tx.commit().await?;

    let selections = load_selections(pool.get_ref(), quiz.id).await?;

    tracing::info!(user_id = user_id, quiz_id = quiz.id, "Quiz created");

    Ok(HttpResponse::Created().json(QuizResponse { quiz, selections }))
}

/// GET /api/quizzes/{id}
pub async fn get_quiz(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let quiz_id = path.into_inner();

    let quiz = sqlx::query_as::<_, QuizRecord>(
        "SELECT id, question, quiz_type, created_by, created_at, updated_at FROM quizzes WHERE id = $1",
    )
    .bind(quiz_id)
    .fetch_one(pool.get_ref())
    .await?;

    let selections = load_selections(pool.get_ref(), quiz_id).await?;

    Ok(HttpResponse::Ok().json(QuizResponse { quiz, selections }))
}

/// GET /api/quizzes/user — all quizzes created by the caller.
pub async fn get_user_quizzes(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id;

    let quizzes = sqlx::query_as::<_, QuizRecord>(
        r#"
        SELECT id, question, quiz_type, created_by, created_at, updated_at
        FROM quizzes
        WHERE created_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(quizzes))
}

/// PUT /api/quizzes/{id}
pub async fn update_quiz(
    path: web::Path<i64>,
    form: web::Json<UpdateQuizRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let quiz_id = path.into_inner();
    let user_id = claims.user_id;

    let question = match &form.question {
        Some(question) => Some(is_valid_text("question", question)?),
        None => None,
    };
    let quiz_type = match &form.quiz_type {
        Some(quiz_type) => Some(validate_quiz_type(quiz_type)?),
        None => None,
    };

    let quiz = sqlx::query_as::<_, QuizRecord>(
        r#"
        UPDATE quizzes
        SET question = COALESCE($1, question),
            quiz_type = COALESCE($2, quiz_type),
            updated_at = now()
        WHERE id = $3 AND created_by = $4
        RETURNING id, question, quiz_type, created_by, created_at, updated_at
        "#,
    )
    .bind(question)
    .bind(quiz_type)
    .bind(quiz_id)
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    let selections = load_selections(pool.get_ref(), quiz_id).await?;

    Ok(HttpResponse::Ok().json(QuizResponse { quiz, selections }))
}

/// DELETE /api/quizzes/{id}
pub async fn delete_quiz(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let quiz_id = path.into_inner();
    let user_id = claims.user_id;

    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1 AND created_by = $2")
        .bind(quiz_id)
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound.into());
    }

    tracing::info!(user_id = user_id, quiz_id = quiz_id, "Quiz deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "quiz deleted successfully"
    })))
}

/// POST /api/quizzes/{id}/selections
pub async fn add_selection(
    path: web::Path<i64>,
    form: web::Json<SelectionInput>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let quiz_id = path.into_inner();
    let user_id = claims.user_id;
    let text = is_valid_text("selection_text", &form.selection_text)?;

    // Ownership check before touching selections.
    sqlx::query_scalar::<_, i64>("SELECT id FROM quizzes WHERE id = $1 AND created_by = $2")
        .bind(quiz_id)
        .bind(user_id)
        .fetch_one(pool.get_ref())
        .await?;

    let selection = sqlx::query_as::<_, SelectionRecord>(
        r#"
        INSERT INTO quiz_selections (quiz_id, selection_text, is_correct)
        VALUES ($1, $2, $3)
        RETURNING id, quiz_id, selection_text, is_correct
        "#,
    )
    .bind(quiz_id)
    .bind(&text)
    .bind(form.is_correct)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(selection))
}

/// DELETE /api/quizzes/{id}/selections/{selection_id}
pub async fn remove_selection(
    path: web::Path<(i64, i64)>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let (quiz_id, selection_id) = path.into_inner();
    let user_id = claims.user_id;

    let result = sqlx::query(
        r#"
        DELETE FROM quiz_selections
        WHERE id = $1
          AND quiz_id IN (SELECT id FROM quizzes WHERE id = $2 AND created_by = $3)
        "#,
    )
    .bind(selection_id)
    .bind(quiz_id)
    .bind(user_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound.into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "selection removed"
    })))
}
