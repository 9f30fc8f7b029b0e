//! Session lifecycle: logout and refresh.
//!
//! Tokens are stateless JWTs. Logout only signals the frontend to drop its
//! copy; the token stays valid until expiry.

use super::types::{ApiMessage, TokenResponse};
use super::{bearer_token, bearer_user, error_response};
use crate::auth::AuthService;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/session/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiMessage),
        (status = 401, description = "Missing or invalid session", body = ApiMessage)
    ),
    tag = "session"
)]
pub async fn logout(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    info!("User {} logged out", user.id);
    (
        StatusCode::OK,
        Json(ApiMessage::ok("Logged out successfully")),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/session/refresh",
    responses(
        (status = 200, description = "Fresh token with extended expiry", body = TokenResponse),
        (status = 401, description = "Missing or invalid session", body = ApiMessage)
    ),
    tag = "session"
)]
pub async fn refresh(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::fail("Missing authorization token")),
        )
            .into_response();
    };

    match service.refresh(token).await {
        Ok(access_token) => (
            StatusCode::OK,
            Json(TokenResponse {
                success: true,
                message: "Token refreshed".to_string(),
                access_token,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}
