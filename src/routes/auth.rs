/// Authentication endpoints: registration, login, token refresh, logout,
/// and the current-user lookup.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::{self, hash_password, validate_password_strength, Claims, UserRecord};
use crate::configuration::AuthSettings;
use crate::error::AppError;
use crate::validators::{is_valid_email, is_valid_username};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/users
///
/// Register a new user. Returns the created user record; the client logs
/// in separately to obtain tokens.
///
/// # Errors
/// - 400: invalid username/email/password
/// - 409: email or username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    validate_password_strength(&form.password)?;
    let password_hash = hash_password(&form.password)?;

    let user = sqlx::query_as::<_, UserRecord>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, created_at, updated_at
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(HttpResponse::Created().json(user))
}

/// POST /api/users/login
///
/// Authenticate with email and password. Returns the user record together
/// with an access/refresh token pair.
///
/// # Errors
/// - 400: malformed email
/// - 401: unknown email or wrong password (same response for both)
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    auth_config: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let outcome = auth::login(pool.get_ref(), auth_config.get_ref(), &email, &form.password).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/users/refresh
///
/// Exchange a refresh token for a new access token. The refresh token
/// itself is not rotated and stays valid until expiry or logout.
///
/// # Errors
/// - 401: unknown, revoked, or expired refresh token
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    auth_config: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let outcome = auth::refresh(pool.get_ref(), auth_config.get_ref(), &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// POST /api/users/logout
///
/// Revoke the given refresh token. Succeeds whether or not the token was
/// known or still active.
pub async fn logout(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    auth::logout(pool.get_ref(), &form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "logged out"
    })))
}

/// GET /api/users/me
///
/// Return the authenticated user's record. The identity comes from the
/// claims injected by the auth middleware.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id;

    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, email, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(user))
}
