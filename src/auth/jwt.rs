/// Access-token issuance and verification.
///
/// Tokens are HS256-signed with the process-wide secret from
/// `AuthSettings`. Verification pins the algorithm, so a token whose header
/// declares anything other than HS256 fails with a signature error.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use crate::auth::claims::Claims;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};

/// Issue a new access token for a user.
///
/// # Errors
/// Returns an internal error if encoding fails.
pub fn issue_access_token(user_id: i64, config: &AuthSettings) -> Result<String, AppError> {
    let claims = Claims::new(user_id, config.access_token_ttl_seconds);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify an access token and extract its claims.
///
/// # Errors
/// - `TokenExpired` when the current time is past `exp`
/// - `TokenNotYetValid` when the current time is before `nbf`
/// - `BadSignature` on signature mismatch or an unexpected algorithm
/// - `TokenMalformed` when the token cannot be parsed at all
pub fn verify_access_token(token: &str, config: &AuthSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        let kind = match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
            _ => AuthError::TokenMalformed,
        };
        tracing::warn!(error = %e, "Access token verification failed");
        AppError::Auth(kind)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthSettings {
        AuthSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_ttl_seconds: 900,
            refresh_token_ttl_seconds: 2_592_000,
        }
    }

    #[test]
    fn issue_then_verify_returns_the_user() {
        let config = test_config();

        let token = issue_access_token(7, &config).expect("Failed to issue token");
        let claims = verify_access_token(&token, &config).expect("Failed to verify token");

        assert_eq!(claims.user_id, 7);
    }

    #[test]
    fn expired_token_is_classified_as_expired() {
        let mut config = test_config();
        config.access_token_ttl_seconds = -120;

        let token = issue_access_token(7, &config).expect("Failed to issue token");
        let err = verify_access_token(&token, &config).unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::TokenExpired)));
    }

    #[test]
    fn wrong_secret_fails_with_bad_signature() {
        let config = test_config();
        let token = issue_access_token(7, &config).expect("Failed to issue token");

        let mut other = test_config();
        other.secret = "a-completely-different-signing-secret-value".to_string();

        let err = verify_access_token(&token, &other).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::BadSignature)));
    }

    #[test]
    fn tampered_payload_never_verifies() {
        let config = test_config();
        let token = issue_access_token(7, &config).expect("Failed to issue token");

        // Flip a byte in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        assert!(verify_access_token(&tampered, &config).is_err());
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let config = test_config();
        let token = issue_access_token(7, &config).expect("Failed to issue token");

        // Strip the signature segment entirely.
        let without_signature = token.rsplit_once('.').map(|(head, _)| format!("{}.", head));
        let err = verify_access_token(&without_signature.unwrap(), &config).unwrap_err();

        assert!(matches!(err, AppError::Auth(_)));
    }

    #[test]
    fn garbage_fails_as_malformed() {
        let config = test_config();
        let err = verify_access_token("not.a.token", &config).unwrap_err();

        assert!(matches!(err, AppError::Auth(AuthError::TokenMalformed)));
    }
}
