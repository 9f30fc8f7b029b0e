//! Two-factor authentication endpoints.

use super::types::{
    ApiMessage, TwoFactorCodeRequest, TwoFactorEnableRequest, TwoFactorSetupResponse,
};
use super::{bearer_user, error_response, missing_payload};
use crate::auth::AuthService;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/2fa/setup",
    responses(
        (status = 200, description = "Fresh secret, provisioning URI and backup codes", body = TwoFactorSetupResponse),
        (status = 401, description = "Missing or invalid session", body = ApiMessage)
    ),
    tag = "2fa"
)]
pub async fn setup(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match service.two_factor_setup(user.id).await {
        Ok(setup) => (
            StatusCode::OK,
            Json(TwoFactorSetupResponse {
                success: true,
                secret: setup.secret,
                provisioning_uri: setup.provisioning_uri,
                backup_codes: setup.backup_codes,
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/enable",
    request_body = TwoFactorEnableRequest,
    responses(
        (status = 200, description = "2FA enabled", body = ApiMessage),
        (status = 401, description = "Code did not verify", body = ApiMessage)
    ),
    tag = "2fa"
)]
pub async fn enable(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<TwoFactorEnableRequest>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service
        .two_factor_enable(user.id, request.secret, &request.code, request.backup_codes)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiMessage::ok("2FA enabled"))).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/verify",
    request_body = TwoFactorCodeRequest,
    responses(
        (status = 200, description = "Code verified", body = ApiMessage),
        (status = 401, description = "Invalid 2FA code", body = ApiMessage)
    ),
    tag = "2fa"
)]
pub async fn verify(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<TwoFactorCodeRequest>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.two_factor_verify(user.id, request.code.trim()).await {
        Ok(()) => (StatusCode::OK, Json(ApiMessage::ok("2FA code verified"))).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/backup",
    request_body = TwoFactorCodeRequest,
    responses(
        (status = 200, description = "Backup code accepted and spent", body = ApiMessage),
        (status = 401, description = "Unknown or already-used backup code", body = ApiMessage)
    ),
    tag = "2fa"
)]
pub async fn backup(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<TwoFactorCodeRequest>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(Json(request)) = payload else {
        return missing_payload();
    };

    match service.two_factor_backup(user.id, request.code.trim()).await {
        Ok(()) => (StatusCode::OK, Json(ApiMessage::ok("Backup code accepted"))).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/2fa/disable",
    responses(
        (status = 200, description = "2FA disabled, secret retained", body = ApiMessage),
        (status = 401, description = "No 2FA enrollment", body = ApiMessage)
    ),
    tag = "2fa"
)]
pub async fn disable(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let user = match bearer_user(&headers, &service).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match service.two_factor_disable(user.id).await {
        Ok(()) => (StatusCode::OK, Json(ApiMessage::ok("2FA disabled"))).into_response(),
        Err(err) => error_response(&err),
    }
}
