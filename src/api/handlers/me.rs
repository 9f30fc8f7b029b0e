//! Authenticated self endpoint.

use super::auth::types::{ApiMessage, MeResponse};
use super::auth::bearer_user;
use crate::auth::AuthService;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = MeResponse),
        (status = 401, description = "Missing or invalid session", body = ApiMessage),
        (status = 404, description = "User no longer exists", body = ApiMessage)
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    match bearer_user(&headers, &service).await {
        Ok(user) => (
            StatusCode::OK,
            Json(MeResponse {
                success: true,
                user: user.into(),
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::test_support::{registered_session, test_service_with_store};
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn me_requires_session() {
        let (service, _store) = test_service_with_store();
        let response = me(HeaderMap::new(), Extension(service)).await.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_returns_profile() {
        let (service, store) = test_service_with_store();
        let token = registered_session(&service, &store, "a@example.com").await;
        let mut headers = HeaderMap::new();
        let value = format!("Bearer {token}");
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&value).expect("header"),
        );
        let response = me(headers, Extension(service)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
