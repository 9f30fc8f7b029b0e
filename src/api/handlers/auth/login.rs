//! Login endpoint.

use super::types::{ApiMessage, LoginRequest, LoginResponse};
use super::{error_response, missing_payload};
use crate::auth::AuthService;
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token minted", body = LoginResponse),
        (status = 401, description = "Invalid credentials or inactive account", body = ApiMessage),
        (status = 403, description = "Email not verified", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
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

    match service.login(&request.email, &request.password).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                message: "Login successful".to_string(),
                access_token: outcome.token,
                requires_2fa: outcome.requires_2fa,
                user: outcome.user.into(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{registered_session, test_service_with_store};

    fn request(email: &str, password: &str) -> Option<Json<LoginRequest>> {
        Some(Json(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
    }

    #[tokio::test]
    async fn login_missing_payload() {
        let (service, _store) = test_service_with_store();
        let response = login(Extension(service), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_unknown_user_is_unauthorized() {
        let (service, _store) = test_service_with_store();
        let response = login(Extension(service), request("a@example.com", "SecurePass123!"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_unverified_is_forbidden() {
        let (service, _store) = test_service_with_store();
        service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("register");
        let response = login(Extension(service), request("a@example.com", "SecurePass123!"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn login_verified_succeeds() {
        let (service, store) = test_service_with_store();
        registered_session(&service, &store, "a@example.com").await;
        let response = login(Extension(service), request("a@example.com", "SecurePass123!"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
