//! Stateless JWT sessions.
//!
//! Tokens are HS256 signed, carry the user id in `sub` and expire after the
//! configured TTL. Logout is client-side only; tokens stay valid until
//! expiry.

use crate::auth::AuthError;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mint a session token for a user.
///
/// # Errors
/// Returns an error if signing fails.
pub fn mint(user_id: Uuid, secret: &SecretString, ttl_seconds: i64) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign session token")
}

/// Verify a session token and return the user id it was minted for.
///
/// # Errors
/// Returns `AuthError::InvalidSession` for any malformed, tampered or
/// expired token.
pub fn verify(token: &str, secret: &SecretString) -> Result<Uuid, AuthError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::InvalidSession)?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSession)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-secret")
    }

    #[test]
    fn mint_and_verify_round_trip() {
        let user_id = Uuid::new_v4();
        let token = mint(user_id, &secret(), 3600).expect("token");
        assert_eq!(verify(&token, &secret()).expect("verify"), user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = mint(Uuid::new_v4(), &secret(), 3600).expect("token");
        let result = verify(&token, &SecretString::from("other-secret"));
        assert!(matches!(result, Err(AuthError::InvalidSession)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = mint(Uuid::new_v4(), &secret(), -60).expect("token");
        let result = verify(&token, &secret());
        assert!(matches!(result, Err(AuthError::InvalidSession)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let result = verify("not-a-jwt", &secret());
        assert!(matches!(result, Err(AuthError::InvalidSession)));
    }
}
