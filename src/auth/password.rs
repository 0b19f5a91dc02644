/// Password hashing and verification.
///
/// Hashing uses bcrypt with a per-call random salt, so hashing the same
/// password twice yields different strings. Verification never errors:
/// empty input, a garbled stored hash, or a plain mismatch all come back
/// as `false`.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password using bcrypt.
///
/// # Errors
/// Fails with a validation error on empty input, or an internal error if
/// bcrypt itself fails.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(AppError::Validation(ValidationError::EmptyField(
            "password".to_string(),
        )));
    }

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored bcrypt hash.
///
/// bcrypt performs the comparison in constant time; a mismatch is an
/// expected outcome, not an error.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if password.is_empty() || stored_hash.is_empty() {
        return false;
    }

    verify(password, stored_hash).unwrap_or(false)
}

/// Validate password strength requirements for registration and updates.
///
/// Requirements: 8-128 characters with at least one digit, one lowercase
/// letter and one uppercase letter.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooShort(
            "password".to_string(),
            MIN_PASSWORD_LENGTH,
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Validation(ValidationError::TooLong(
            "password".to_string(),
            MAX_PASSWORD_LENGTH,
        )));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Validation(ValidationError::InvalidFormat(
            "password must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}
