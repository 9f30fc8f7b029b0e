//! End-to-end credential lifecycle tests over the in-memory store.
//!
//! These exercise the same `AuthService` flows the HTTP handlers call:
//! registration and email verification, login gating, OTP password reset,
//! and the full 2FA enrollment cycle.

use chrono::{Duration, Utc};
use greenledger::{
    auth::{AuthConfig, AuthError, AuthService, totp},
    mailer::LogMailer,
    store::{MemoryStore, OtpStore, VerificationTokenStore},
};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const EMAIL: &str = "user@example.com";
const PASSWORD: &str = "SecurePass123!";

fn service() -> (AuthService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = AuthConfig::new(
        "http://localhost:3000".to_string(),
        SecretString::from("integration-secret"),
    );
    let service = AuthService::new(store.clone(), Arc::new(LogMailer), config);
    (service, store)
}

/// Register and verify, returning the user id.
async fn verified_user(service: &AuthService, store: &MemoryStore) -> uuid::Uuid {
    let outcome = service.register(EMAIL, PASSWORD).await.expect("register");
    store
        .insert_verification_token(EMAIL, "fixture-token", Utc::now() + Duration::hours(24))
        .await
        .expect("insert token");
    service
        .verify_email("fixture-token")
        .await
        .expect("verify email");
    outcome.user_id
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[tokio::test]
async fn login_is_gated_on_verification() {
    let (service, store) = service();
    service.register(EMAIL, PASSWORD).await.expect("register");

    let err = service.login(EMAIL, PASSWORD).await.expect_err("unverified");
    assert!(matches!(err, AuthError::UnverifiedEmail));

    store
        .insert_verification_token(EMAIL, "fixture-token", Utc::now() + Duration::hours(24))
        .await
        .expect("insert token");
    service.verify_email("fixture-token").await.expect("verify");

    let outcome = service.login(EMAIL, PASSWORD).await.expect("login");
    assert!(!outcome.requires_2fa);
    assert!(outcome.user.is_verified);

    // The minted token resolves back to the same user.
    let user = service.current_user(&outcome.token).await.expect("me");
    assert_eq!(user.id, outcome.user.id);
}

#[tokio::test]
async fn verification_token_is_single_use() {
    let (service, store) = service();
    service.register(EMAIL, PASSWORD).await.expect("register");
    store
        .insert_verification_token(EMAIL, "fixture-token", Utc::now() + Duration::hours(24))
        .await
        .expect("insert token");

    service.verify_email("fixture-token").await.expect("first");
    let err = service
        .verify_email("fixture-token")
        .await
        .expect_err("second");
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn expired_verification_token_is_rejected() {
    let (service, store) = service();
    service.register(EMAIL, PASSWORD).await.expect("register");
    store
        .insert_verification_token(EMAIL, "stale-token", Utc::now() - Duration::hours(1))
        .await
        .expect("insert token");

    let err = service
        .verify_email("stale-token")
        .await
        .expect_err("expired");
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn password_reset_consumes_the_otp() {
    let (service, store) = service();
    let _ = verified_user(&service, &store).await;
    store
        .insert_reset_otp(EMAIL, "654321", Utc::now() + Duration::minutes(10))
        .await
        .expect("insert otp");

    service
        .reset_password(EMAIL, "654321", "NewSecurePass123!")
        .await
        .expect("reset");

    // Old password no longer works, new one does.
    let err = service.login(EMAIL, PASSWORD).await.expect_err("old password");
    assert!(matches!(err, AuthError::InvalidCredentials));
    service
        .login(EMAIL, "NewSecurePass123!")
        .await
        .expect("new password");

    // Spent OTP cannot reset again.
    let err = service
        .reset_password(EMAIL, "654321", "AnotherPass123!")
        .await
        .expect_err("spent otp");
    assert!(matches!(err, AuthError::InvalidOtp));
}

#[tokio::test]
async fn expired_otp_is_rejected() {
    let (service, store) = service();
    let _ = verified_user(&service, &store).await;
    store
        .insert_reset_otp(EMAIL, "654321", Utc::now() - Duration::minutes(1))
        .await
        .expect("insert otp");

    let err = service
        .reset_password(EMAIL, "654321", "NewSecurePass123!")
        .await
        .expect_err("expired otp");
    assert!(matches!(err, AuthError::InvalidOtp));
}

#[tokio::test]
async fn weak_reset_password_reports_first_failing_rule() {
    let (service, store) = service();
    let _ = verified_user(&service, &store).await;
    store
        .insert_reset_otp(EMAIL, "654321", Utc::now() + Duration::minutes(10))
        .await
        .expect("insert otp");

    let err = service
        .reset_password(EMAIL, "654321", "short")
        .await
        .expect_err("weak password");
    assert_eq!(
        err.to_string(),
        "Password must be at least 8 characters long"
    );

    // Validation failed before the OTP was touched, so it is still usable.
    service
        .reset_password(EMAIL, "654321", "NewSecurePass123!")
        .await
        .expect("reset with valid password");
}

#[tokio::test]
async fn verification_token_expiry_boundary() {
    let (service, store) = service();
    service.register(EMAIL, PASSWORD).await.expect("register");

    // One second past expiry is dead.
    store
        .insert_verification_token(EMAIL, "just-expired", Utc::now() - Duration::seconds(1))
        .await
        .expect("insert token");
    let err = service
        .verify_email("just-expired")
        .await
        .expect_err("one second past expiry");
    assert!(matches!(err, AuthError::InvalidToken));

    // One second before expiry still verifies.
    store
        .insert_verification_token(EMAIL, "about-to-expire", Utc::now() + Duration::seconds(1))
        .await
        .expect("insert token");
    service
        .verify_email("about-to-expire")
        .await
        .expect("one second before expiry");
}

#[tokio::test]
async fn otp_expiry_boundary() {
    let (service, store) = service();
    let _ = verified_user(&service, &store).await;

    store
        .insert_reset_otp(EMAIL, "111111", Utc::now() - Duration::seconds(1))
        .await
        .expect("insert otp");
    let err = service
        .reset_password(EMAIL, "111111", "NewSecurePass123!")
        .await
        .expect_err("one second past expiry");
    assert!(matches!(err, AuthError::InvalidOtp));

    store
        .insert_reset_otp(EMAIL, "222222", Utc::now() + Duration::seconds(1))
        .await
        .expect("insert otp");
    service
        .reset_password(EMAIL, "222222", "NewSecurePass123!")
        .await
        .expect("one second before expiry");
}

#[tokio::test]
async fn two_factor_full_cycle() {
    let (service, store) = service();
    let user_id = verified_user(&service, &store).await;

    let setup = service.two_factor_setup(user_id).await.expect("setup");
    assert_eq!(setup.backup_codes.len(), 10);

    // Setup alone persists nothing.
    let err = service
        .two_factor_verify(user_id, "000000")
        .await
        .expect_err("not enrolled yet");
    assert!(matches!(err, AuthError::InvalidTwoFactor));

    let code = totp::code_at(&setup.secret, unix_now()).expect("code");
    service
        .two_factor_enable(
            user_id,
            Some(setup.secret.clone()),
            &code,
            Some(setup.backup_codes.clone()),
        )
        .await
        .expect("enable");

    let login = service.login(EMAIL, PASSWORD).await.expect("login");
    assert!(login.requires_2fa);

    let code = totp::code_at(&setup.secret, unix_now()).expect("code");
    service
        .two_factor_verify(user_id, &code)
        .await
        .expect("verify");

    // Backup codes are single use.
    let backup = setup.backup_codes[0].clone();
    service
        .two_factor_backup(user_id, &backup)
        .await
        .expect("first backup use");
    let err = service
        .two_factor_backup(user_id, &backup)
        .await
        .expect_err("second backup use");
    assert!(matches!(err, AuthError::InvalidTwoFactor));

    // Disable keeps the secret; re-enable works against it without a new
    // provisioning step.
    service.two_factor_disable(user_id).await.expect("disable");
    let err = service
        .two_factor_verify(user_id, &code)
        .await
        .expect_err("disabled");
    assert!(matches!(err, AuthError::InvalidTwoFactor));

    let code = totp::code_at(&setup.secret, unix_now()).expect("code");
    service
        .two_factor_enable(user_id, None, &code, None)
        .await
        .expect("re-enable");
    let code = totp::code_at(&setup.secret, unix_now()).expect("code");
    service
        .two_factor_verify(user_id, &code)
        .await
        .expect("verify after re-enable");
}

#[tokio::test]
async fn refresh_extends_a_valid_session() {
    let (service, store) = service();
    let _ = verified_user(&service, &store).await;
    let login = service.login(EMAIL, PASSWORD).await.expect("login");

    let refreshed = service.refresh(&login.token).await.expect("refresh");
    let user = service.current_user(&refreshed).await.expect("me");
    assert_eq!(user.email, EMAIL);

    let err = service.refresh("garbage").await.expect_err("bad token");
    assert!(matches!(err, AuthError::InvalidSession));
}
