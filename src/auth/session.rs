/// Session orchestration: login, token refresh, logout.
///
/// There is no persisted session object; the refresh token is the session
/// handle. Login verifies credentials and hands out an access/refresh token
/// pair, refresh mints a new access token against a stored refresh token,
/// and logout revokes the refresh token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::jwt::issue_access_token;
use crate::auth::password::verify_password;
use crate::auth::refresh_token::{
    generate_refresh_token, revoke_refresh_token, save_refresh_token, validate_refresh_token,
};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

/// A user record as returned to clients. The password hash is never part
/// of this type, so it cannot leak through serialization.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct RefreshOutcome {
    pub access_token: String,
    pub expires_in: i64,
}

/// Authenticate a user and open a session.
///
/// An unknown email and a wrong password both fail with
/// `InvalidCredentials`; the caller cannot tell which check failed.
pub async fn login(
    pool: &PgPool,
    config: &AuthSettings,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, AppError> {
    let row = sqlx::query_as::<_, (i64, String, String, String, DateTime<Utc>, DateTime<Utc>)>(
        r#"
        SELECT id, username, email, password_hash, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let (id, username, email, password_hash, created_at, updated_at) = match row {
        Some(row) => row,
        None => {
            tracing::warn!("Login attempt for unknown email");
            return Err(AppError::Auth(AuthError::InvalidCredentials));
        }
    };

    if !verify_password(password, &password_hash) {
        tracing::warn!(user_id = id, "Login attempt with wrong password");
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = issue_access_token(id, config)?;
    let refresh_token = generate_refresh_token();
    save_refresh_token(pool, id, &refresh_token, config.refresh_token_ttl_seconds).await?;

    tracing::info!(user_id = id, "User logged in");

    Ok(LoginOutcome {
        user: UserRecord {
            id,
            username,
            email,
            created_at,
            updated_at,
        },
        access_token,
        refresh_token,
        expires_in: config.access_token_ttl_seconds,
    })
}

/// Mint a new access token against a stored refresh token.
///
/// The refresh token is not rotated: the same secret stays valid until its
/// own expiry or an explicit logout.
pub async fn refresh(
    pool: &PgPool,
    config: &AuthSettings,
    refresh_token: &str,
) -> Result<RefreshOutcome, AppError> {
    let stored = validate_refresh_token(pool, refresh_token).await?;

    let access_token = issue_access_token(stored.user_id, config)?;

    tracing::info!(user_id = stored.user_id, "Access token refreshed");

    Ok(RefreshOutcome {
        access_token,
        expires_in: config.access_token_ttl_seconds,
    })
}

/// Close a session by revoking its refresh token.
///
/// Always succeeds from the caller's perspective, whether or not the secret
/// matched an active token.
pub async fn logout(pool: &PgPool, refresh_token: &str) -> Result<(), AppError> {
    revoke_refresh_token(pool, refresh_token).await?;
    tracing::info!("Session closed");
    Ok(())
}
