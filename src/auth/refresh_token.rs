/// Refresh-token store.
///
/// Refresh tokens are opaque 64-character random secrets with no embedded
/// structure. Only a SHA-256 hash of the secret is persisted; the plaintext
/// exists client-side only. A token moves through exactly one state change,
/// active -> revoked, and expiry is a time-based check at validation.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::error::{AppError, AuthError};

const REFRESH_TOKEN_LENGTH: usize = 64;

/// A stored refresh-token record, as seen by the session layer.
#[derive(Debug)]
pub struct StoredRefreshToken {
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Generate a new refresh-token secret from the OS CSPRNG.
///
/// The secret is independent of the user id and the clock; it cannot be
/// derived or guessed.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh-token secret for storage. Plaintext secrets never touch
/// the database.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persist a freshly issued refresh token.
///
/// The `token_hash` column carries a unique index, so a generation
/// collision surfaces as a database error instead of overwriting an
/// existing row.
pub async fn save_refresh_token(
    pool: &PgPool,
    user_id: i64,
    token: &str,
    ttl_seconds: i64,
) -> Result<(), AppError> {
    let token_hash = hash_token(token);
    let expires_at = Utc::now() + Duration::seconds(ttl_seconds);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Validate a refresh-token secret and load its record.
///
/// The lookup excludes revoked rows, so a revoked token fails with the same
/// `RefreshTokenNotFound` as a token that never existed; callers get no
/// signal about revocation state. An unrevoked but stale record fails with
/// `TokenExpired`, which callers classify separately.
pub async fn validate_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<StoredRefreshToken, AppError> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        r#"
        SELECT user_id, expires_at
        FROM refresh_tokens
        WHERE token_hash = $1 AND revoked = false
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    match row {
        None => {
            tracing::warn!("Refresh token not found or revoked");
            Err(AppError::Auth(AuthError::RefreshTokenNotFound))
        }
        Some((user_id, expires_at)) => {
            if expires_at <= Utc::now() {
                tracing::info!(user_id = user_id, "Refresh token expired");
                return Err(AppError::Auth(AuthError::TokenExpired));
            }

            Ok(StoredRefreshToken {
                user_id,
                expires_at,
            })
        }
    }
}

/// Revoke a refresh token.
///
/// Idempotent, fire-and-forget: revoking an unknown or already-revoked
/// secret is not an error, and a token is never un-revoked. The single-row
/// UPDATE is atomic, so a racing validate sees the revocation entirely or
/// not at all.
pub async fn revoke_refresh_token(pool: &PgPool, token: &str) -> Result<(), AppError> {
    let token_hash = hash_token(token);

    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, updated_at = $1
        WHERE token_hash = $2
        "#,
    )
    .bind(Utc::now())
    .bind(token_hash)
    .execute(pool)
    .await?;

    Ok(())
}

/// Revoke every active refresh token belonging to a user
/// (logout-everywhere).
pub async fn revoke_all_user_tokens(pool: &PgPool, user_id: i64) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, updated_at = $1
        WHERE user_id = $2 AND revoked = false
        "#,
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    tracing::info!(user_id = user_id, "All refresh tokens revoked for user");
    Ok(())
}

/// Delete rows that are already logically invalid (expired or revoked).
///
/// Storage hygiene only; validation never depends on this running. Invoked
/// from a single background task, off the request path.
pub async fn prune_expired(pool: &PgPool) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM refresh_tokens
        WHERE expires_at < $1 OR revoked = true
        "#,
    )
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_has_expected_shape() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), REFRESH_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generated_secrets_are_unique() {
        let first = generate_refresh_token();
        let second = generate_refresh_token();

        assert_ne!(first, second);
    }

    #[test]
    fn stored_form_is_a_hash_of_the_secret() {
        let token = generate_refresh_token();

        let hash1 = hash_token(&token);
        let hash2 = hash_token(&token);

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, token);
        // SHA-256 hex digest
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn different_secrets_hash_differently() {
        let hash1 = hash_token(&generate_refresh_token());
        let hash2 = hash_token(&generate_refresh_token());

        assert_ne!(hash1, hash2);
    }
}
