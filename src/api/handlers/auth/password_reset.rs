//! Password reset request and completion.

use super::types::{ApiMessage, PasswordResetRequest, ResetPasswordRequest};
use super::{error_response, missing_payload};
use crate::auth::AuthService;
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/request-password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Accepted; an OTP is sent when the email exists", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn request_password_reset(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail("Email is required")),
        )
            .into_response();
    }

    // Same response for known and unknown emails, so the endpoint cannot be
    // used to probe for accounts.
    match service.request_password_reset(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiMessage::ok("If the email exists, an OTP will be sent")),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiMessage),
        (status = 400, description = "Invalid OTP or weak password", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.email.trim().is_empty() || request.otp.trim().is_empty()
        || request.new_password.is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail("Email, OTP, and new password are required")),
        )
            .into_response();
    }

    match service
        .reset_password(&request.email, request.otp.trim(), &request.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiMessage::ok("Password reset successfully")),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
