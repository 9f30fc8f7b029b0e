//! Input validation for emails, passwords and OTP codes.

use crate::auth::AuthError;
use regex::Regex;

const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Normalize an email for lookup/uniqueness checks. Addresses are stored as
/// given and compared case-sensitively; only surrounding whitespace goes.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Validate email format, rejecting with a message suitable for responses.
///
/// # Errors
/// Returns `AuthError::Validation` when the email is not a plausible address.
pub fn validate_email(email_normalized: &str) -> Result<(), AuthError> {
    if valid_email(email_normalized) {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "Invalid email: {email_normalized}"
        )))
    }
}

/// Validate password strength.
///
/// Rules: at least 8 characters, one lowercase, one uppercase, one digit and
/// one special character. The first failing rule names itself in the error.
///
/// # Errors
/// Returns `AuthError::Validation` with the first failing rule.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AuthError::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AuthError::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::Validation(
            "Password must contain at least one digit".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AuthError::Validation(
            "Password must contain at least one special character".to_string(),
        ));
    }
    Ok(())
}

/// Validate OTP shape before hitting storage.
///
/// # Errors
/// Returns `AuthError::Validation` unless the OTP is exactly 6 ASCII digits.
pub fn validate_otp(otp: &str) -> Result<(), AuthError> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AuthError::Validation("OTP must be 6 digits".to_string()))
    }
}
