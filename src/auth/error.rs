//! Error taxonomy for authentication flows.
//!
//! Messages are part of the HTTP contract: credential failures stay uniform
//! to avoid account probing, while inactive and unverified accounts are
//! reported distinctly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed validation; the message names the offending rule.
    #[error("{0}")]
    Validation(String),

    /// Wrong email or wrong password, reported uniformly.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User account is inactive")]
    InactiveAccount,

    #[error("Email not verified")]
    UnverifiedEmail,

    #[error("User already exists")]
    DuplicateEmail,

    #[error("Invalid or expired verification token")]
    InvalidToken,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid 2FA code")]
    InvalidTwoFactor,

    #[error("Invalid or expired session")]
    InvalidSession,

    /// Outbound mail could not be handed to the mailer.
    #[error("Failed to send email")]
    Transport(#[source] anyhow::Error),

    /// Storage failure; details stay in logs, never in responses.
    #[error("Storage failure")]
    Store(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_http_contract() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::InactiveAccount.to_string(),
            "User account is inactive"
        );
        assert_eq!(
            AuthError::InvalidToken.to_string(),
            "Invalid or expired verification token"
        );
        assert_eq!(AuthError::InvalidOtp.to_string(), "Invalid or expired OTP");
        assert_eq!(
            AuthError::DuplicateEmail.to_string(),
            "User already exists"
        );
    }

    #[test]
    fn validation_carries_rule_message() {
        let err = AuthError::Validation("OTP must be 6 digits".to_string());
        assert_eq!(err.to_string(), "OTP must be 6 digits");
    }
}
