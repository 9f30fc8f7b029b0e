//! Request/response types for auth endpoints.

use crate::store::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic `{ success, message }` envelope.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
            two_factor_enabled: user.two_factor_enabled,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub requires_2fa: bool,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TwoFactorSetupResponse {
    pub success: bool,
    pub secret: String,
    pub provisioning_uri: String,
    pub backup_codes: Vec<String>,
}

/// With `secret` present this confirms a fresh enrollment; without it, a
/// previously disabled credential is re-enabled against its stored secret.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TwoFactorEnableRequest {
    #[serde(default)]
    pub secret: Option<String>,
    pub code: String,
    #[serde(default)]
    pub backup_codes: Option<Vec<String>>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TwoFactorCodeRequest {
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn enable_request_optional_fields_default() -> Result<()> {
        let decoded: TwoFactorEnableRequest = serde_json::from_str(r#"{"code":"123456"}"#)?;
        assert!(decoded.secret.is_none());
        assert!(decoded.backup_codes.is_none());
        assert_eq!(decoded.code, "123456");
        Ok(())
    }

    #[test]
    fn api_message_round_trips() -> Result<()> {
        let value = serde_json::to_value(ApiMessage::fail("Invalid email or password"))?;
        let success = value
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .context("missing success")?;
        assert!(!success);
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("Invalid email or password")
        );
        Ok(())
    }
}
