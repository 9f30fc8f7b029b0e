//! Shared fixtures for handler tests.

use crate::auth::{AuthConfig, AuthService};
use crate::mailer::LogMailer;
use crate::store::{MemoryStore, VerificationTokenStore};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::Arc;

pub(crate) fn test_service() -> Arc<AuthService> {
    test_service_with_store().0
}

pub(crate) fn test_service_with_store() -> (Arc<AuthService>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = AuthConfig::new(
        "http://localhost:3000".to_string(),
        SecretString::from("test-secret"),
    );
    let service = Arc::new(AuthService::new(
        store.clone(),
        Arc::new(LogMailer),
        config,
    ));
    (service, store)
}

/// Register and verify an account, returning a valid session token.
pub(crate) async fn registered_session(
    service: &AuthService,
    store: &MemoryStore,
    email: &str,
) -> String {
    service
        .register(email, "SecurePass123!")
        .await
        .expect("register");
    let token = format!("fixture-{email}");
    store
        .insert_verification_token(email, &token, Utc::now() + Duration::hours(1))
        .await
        .expect("insert token");
    service.verify_email(&token).await.expect("verify email");
    service
        .login(email, "SecurePass123!")
        .await
        .expect("login")
        .token
}
