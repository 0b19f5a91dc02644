/// Request input validation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AppError, ValidationError};

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 6; // a@b.co
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 32;
const MAX_TEXT_LENGTH: usize = 1024;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Validates an email address and returns it trimmed.
pub fn is_valid_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()).into());
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email".to_string(), MIN_EMAIL_LENGTH).into());
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH).into());
    }

    if !EMAIL_REGEX.is_match(trimmed) || trimmed.matches('@').count() != 1 {
        return Err(
            ValidationError::InvalidFormat("email has invalid format".to_string()).into(),
        );
    }

    Ok(trimmed.to_string())
}

/// Validates a username: 3-32 characters, alphanumeric plus `_` and `-`.
pub fn is_valid_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("username".to_string()).into());
    }

    if trimmed.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::TooShort("username".to_string(), MIN_USERNAME_LENGTH).into());
    }

    if trimmed.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong("username".to_string(), MAX_USERNAME_LENGTH).into());
    }

    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat(
            "username may only contain letters, digits, underscores, and dashes".to_string(),
        )
        .into());
    }

    Ok(trimmed.to_string())
}

/// Validates free text fields such as quiz questions and suite titles:
/// non-empty, bounded length, no control characters.
pub fn is_valid_text(field: &'static str, text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()).into());
    }

    if trimmed.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong(field.to_string(), MAX_TEXT_LENGTH).into());
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(format!(
            "{} contains control characters",
            field
        ))
        .into());
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_emails() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn rejects_invalid_emails() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("").is_err());
    }

    #[test]
    fn enforces_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());
        assert!(is_valid_email("a@a.c").is_err());
        assert!(is_valid_email("a@b.co").is_ok());
    }

    #[test]
    fn accepts_valid_usernames() {
        assert!(is_valid_username("alice").is_ok());
        assert!(is_valid_username("quiz_master-42").is_ok());
    }

    #[test]
    fn rejects_invalid_usernames() {
        assert!(is_valid_username("ab").is_err());
        assert!(is_valid_username(&"a".repeat(33)).is_err());
        assert!(is_valid_username("has spaces").is_err());
        assert!(is_valid_username("semi;colon").is_err());
    }

    #[test]
    fn text_rules() {
        assert!(is_valid_text("question", "What is Rust?").is_ok());
        assert!(is_valid_text("question", "   ").is_err());
        assert!(is_valid_text("question", &"a".repeat(1025)).is_err());
        assert!(is_valid_text("question", "bad\0text").is_err());
    }
}
