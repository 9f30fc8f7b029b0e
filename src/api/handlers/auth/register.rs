//! Account registration.

use super::types::{ApiMessage, RegisterRequest, RegisterResponse};
use super::{error_response, missing_payload};
use crate::auth::AuthService;
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email dispatched", body = RegisterResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    if request.email.trim().is_empty() || request.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::fail("Email and password are required")),
        )
            .into_response();
    }

    match service.register(&request.email, &request.password).await {
        Ok(outcome) => {
            let message = if outcome.mail_delivered {
                "User registered successfully. Please verify your email."
            } else {
                "User registered. Please check your email to verify (email system may be down)"
            };
            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    success: true,
                    message: message.to_string(),
                    user_id: outcome.user_id.to_string(),
                    email: outcome.email,
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}
