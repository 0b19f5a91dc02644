/// User record endpoints. All of these sit behind the auth middleware.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::{
    hash_password, revoke_all_user_tokens, validate_password_strength, Claims, UserRecord,
};
use crate::error::{AppError, AuthError};
use crate::validators::{is_valid_email, is_valid_username};

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// GET /api/users/{id}
pub async fn get_user(
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, email, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(user))
}

/// PUT /api/users/{id}
///
/// Update the caller's own record. Fields are optional; a new password is
/// re-hashed and every open session for the user is revoked.
pub async fn update_user(
    path: web::Path<i64>,
    form: web::Json<UpdateUserRequest>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if claims.user_id != user_id {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let username = match &form.username {
        Some(username) => Some(is_valid_username(username)?),
        None => None,
    };
    let email = match &form.email {
        Some(email) => Some(is_valid_email(email)?),
        None => None,
    };
    let password_hash = match &form.password {
        Some(password) => {
            validate_password_strength(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = sqlx::query_as::<_, UserRecord>(
        r#"
        UPDATE users
        SET username = COALESCE($1, username),
            email = COALESCE($2, email),
            password_hash = COALESCE($3, password_hash),
            updated_at = now()
        WHERE id = $4
        RETURNING id, username, email, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(user_id)
    .fetch_one(pool.get_ref())
    .await?;

    // A password change invalidates every open session.
    if password_hash.is_some() {
        revoke_all_user_tokens(pool.get_ref(), user_id).await?;
    }

    tracing::info!(user_id = user_id, "User updated");

    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /api/users/{id}
///
/// Delete the caller's own account. Refresh tokens go with it through the
/// foreign-key cascade.
pub async fn delete_user(
    path: web::Path<i64>,
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if claims.user_id != user_id {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound.into());
    }

    tracing::info!(user_id = user_id, "User deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "user deleted successfully"
    })))
}
