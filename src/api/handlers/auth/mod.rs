//! Auth endpoint handlers and shared helpers.

pub mod login;
pub mod password_reset;
pub mod register;
pub mod session;
pub mod two_factor;
pub mod types;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

use crate::auth::{AuthError, AuthService};
use crate::store::User;
use axum::{
    Json,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use tracing::error;
use types::ApiMessage;

/// Map a service error to its HTTP status and `{ success, message }` body.
///
/// Storage and transport details are logged here and never echoed to the
/// caller.
pub(crate) fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::Validation(_)
        | AuthError::DuplicateEmail
        | AuthError::InvalidToken
        | AuthError::InvalidOtp => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::InactiveAccount
        | AuthError::InvalidTwoFactor
        | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::UnverifiedEmail => StatusCode::FORBIDDEN,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::Transport(_) | AuthError::Store(_) => {
            error!("Auth request failed: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiMessage::fail(err.to_string()))).into_response()
}

pub(crate) fn missing_payload() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiMessage::fail("Missing payload")),
    )
        .into_response()
}

/// Pull the raw token out of an `Authorization: Bearer` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the authenticated user or produce the 401 response.
pub(crate) async fn bearer_user(
    headers: &HeaderMap,
    service: &AuthService,
) -> Result<User, Response> {
    let Some(token) = bearer_token(headers) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::fail("Missing authorization token")),
        )
            .into_response());
    };
    service
        .current_user(token)
        .await
        .map_err(|err| error_response(&err))
}
