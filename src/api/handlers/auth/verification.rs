//! Email verification endpoint.

use super::types::{ApiMessage, VerifyEmailRequest};
use super::{error_response, missing_payload};
use crate::auth::AuthService;
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiMessage),
        (status = 400, description = "Invalid or expired token", body = ApiMessage),
        (status = 404, description = "Token's user no longer exists", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.verify_email(&request.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiMessage::ok("Email verified successfully")),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
