//! Outbound email.
//!
//! The [`Mailer`] trait is the delivery seam; [`LogMailer`] logs messages
//! instead of delivering them and stands in until an SMTP relay is wired up.
//! Message bodies are built here so flows stay delivery-agnostic.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message.
    ///
    /// # Errors
    /// Returns an error when the message could not be handed off.
    async fn send(&self, mail: Mail) -> Result<()>;
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<()> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            "Email dispatched (log only)"
        );
        Ok(())
    }
}

/// Build the email-verification message with its frontend link.
#[must_use]
pub fn verification_mail(to: &str, from_name: &str, verify_url: &str) -> Mail {
    let text = format!(
        "Hello,\n\n\
        Thank you for registering with {from_name}!\n\n\
        Please verify your email by clicking the link below:\n\
        {verify_url}\n\n\
        This link will expire in 24 hours.\n\n\
        If you did not create this account, please ignore this email.\n\n\
        Best regards,\n{from_name}\n"
    );
    let html = format!(
        "<html>\n  <body>\n    <p>Hello,</p>\n    \
        <p>Thank you for registering with {from_name}!</p>\n    \
        <p>Please verify your email by clicking the link below:</p>\n    \
        <p><a href=\"{verify_url}\">Verify Email</a></p>\n    \
        <p>This link will expire in 24 hours.</p>\n    \
        <p>If you did not create this account, please ignore this email.</p>\n    \
        <p>Best regards,<br>{from_name}</p>\n  </body>\n</html>\n"
    );
    Mail {
        to: to.to_string(),
        subject: "Email Verification Required".to_string(),
        text,
        html,
    }
}

/// Build the password-reset message carrying the OTP.
#[must_use]
pub fn reset_otp_mail(to: &str, from_name: &str, otp: &str, expiry_minutes: i64) -> Mail {
    let text = format!(
        "Hello,\n\n\
        Your password reset OTP is: {otp}\n\n\
        This OTP will expire in {expiry_minutes} minutes.\n\n\
        If you did not request a password reset, please ignore this email.\n\n\
        Best regards,\n{from_name}\n"
    );
    let html = format!(
        "<html>\n  <body>\n    <p>Hello,</p>\n    \
        <p>Your password reset OTP is: <strong>{otp}</strong></p>\n    \
        <p>This OTP will expire in {expiry_minutes} minutes.</p>\n    \
        <p>If you did not request a password reset, please ignore this email.</p>\n    \
        <p>Best regards,<br>{from_name}</p>\n  </body>\n</html>\n"
    );
    Mail {
        to: to.to_string(),
        subject: "Password Reset OTP".to_string(),
        text,
        html,
    }
}

/// Build the frontend verification link included in outbound emails.
#[must_use]
pub fn build_verify_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}")
}
