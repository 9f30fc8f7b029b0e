//! Orchestration of registration, login, password reset and 2FA.
//!
//! `AuthService` owns the policy: validation order, oracle-avoidance rules
//! and which store/mailer calls make up each flow. Storage and delivery
//! stay behind the `AuthStore` and `Mailer` traits.

use crate::{
    auth::{AuthError, codes, password, session, totp, validate},
    mailer::{self, Mailer},
    store::{AuthStore, TokenConsume, User},
};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Email verification links stay valid for 24 hours.
const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct AuthConfig {
    frontend_base_url: String,
    jwt_secret: SecretString,
    otp_expiry_minutes: i64,
    session_ttl_seconds: i64,
    totp_issuer: String,
    mail_from_name: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, jwt_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            jwt_secret,
            otp_expiry_minutes: 10,
            session_ttl_seconds: 3600,
            totp_issuer: "GreenLedger".to_string(),
            mail_from_name: "GreenLedger".to_string(),
        }
    }

    #[must_use]
    pub fn with_otp_expiry_minutes(mut self, minutes: i64) -> Self {
        self.otp_expiry_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_totp_issuer(mut self, issuer: String) -> Self {
        self.totp_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_mail_from_name(mut self, name: String) -> Self {
        self.mail_from_name = name;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn otp_expiry_minutes(&self) -> i64 {
        self.otp_expiry_minutes
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }

    #[must_use]
    pub fn mail_from_name(&self) -> &str {
        &self.mail_from_name
    }
}

#[derive(Debug)]
pub struct RegisterOutcome {
    pub user_id: Uuid,
    pub email: String,
    /// False when the verification mail could not be handed off; the
    /// account exists either way.
    pub mail_delivered: bool,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
    /// Signals the frontend to prompt for a TOTP or backup code.
    pub requires_2fa: bool,
}

#[derive(Debug)]
pub struct TwoFactorSetup {
    pub secret: String,
    pub provisioning_uri: String,
    pub backup_codes: Vec<String>,
}

pub struct AuthService {
    store: Arc<dyn AuthStore>,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn AuthStore>, mailer: Arc<dyn Mailer>, config: AuthConfig) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new account and dispatch the verification mail.
    ///
    /// # Errors
    /// Validation failures, duplicate email, or storage failures.
    pub async fn register(&self, email: &str, pass: &str) -> Result<RegisterOutcome, AuthError> {
        let email = validate::normalize_email(email);
        validate::validate_email(&email)?;
        validate::validate_password(pass)?;

        let password_hash = password::hash_password(pass).map_err(AuthError::Store)?;
        let user = self
            .store
            .insert_user(&email, &password_hash)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::DuplicateEmail)?;

        let token = codes::generate_verification_token().map_err(AuthError::Store)?;
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
        self.store
            .insert_verification_token(&email, &token, expires_at)
            .await
            .map_err(AuthError::Store)?;

        let verify_url = mailer::build_verify_url(self.config.frontend_base_url(), &token);
        let mail = mailer::verification_mail(&email, self.config.mail_from_name(), &verify_url);
        // A dead mail relay must not undo the registration; the outcome
        // carries the delivery state so the response can say so.
        let mail_delivered = match self.mailer.send(mail).await {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to send verification email: {err:#}");
                false
            }
        };

        Ok(RegisterOutcome {
            user_id: user.id,
            email,
            mail_delivered,
        })
    }

    /// Consume a verification token and activate the account.
    ///
    /// # Errors
    /// `InvalidToken` for unknown/expired/consumed tokens, `UserNotFound`
    /// when the token's user no longer exists.
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        match self
            .store
            .consume_verification_token(token)
            .await
            .map_err(AuthError::Store)?
        {
            TokenConsume::Verified => Ok(()),
            TokenConsume::NotFound => Err(AuthError::InvalidToken),
            TokenConsume::UserMissing => Err(AuthError::UserNotFound),
        }
    }

    /// Authenticate and mint a session token.
    ///
    /// Unknown email and wrong password fail identically; inactive and
    /// unverified accounts are reported distinctly, before any token is
    /// minted.
    ///
    /// # Errors
    /// `InvalidCredentials`, `InactiveAccount`, `UnverifiedEmail`, or
    /// storage failures.
    pub async fn login(&self, email: &str, pass: &str) -> Result<LoginOutcome, AuthError> {
        let email = validate::normalize_email(email);
        let user = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(pass, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }
        if !user.is_verified {
            return Err(AuthError::UnverifiedEmail);
        }

        let token = session::mint(
            user.id,
            self.config.jwt_secret(),
            self.config.session_ttl_seconds(),
        )
        .map_err(AuthError::Store)?;

        let requires_2fa = user.two_factor_enabled;
        Ok(LoginOutcome {
            token,
            user,
            requires_2fa,
        })
    }

    /// Issue a password reset OTP.
    ///
    /// Unknown emails succeed without writing or sending anything, so the
    /// caller cannot probe for accounts.
    ///
    /// # Errors
    /// `Transport` when the OTP mail fails to send (the OTP stays
    /// persisted and usable), or storage failures.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = validate::normalize_email(email);
        let Some(user) = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(AuthError::Store)?
        else {
            return Ok(());
        };

        let otp = codes::generate_otp();
        let expires_at = Utc::now() + Duration::minutes(self.config.otp_expiry_minutes());
        self.store
            .insert_reset_otp(&user.email, &otp, expires_at)
            .await
            .map_err(AuthError::Store)?;

        let mail = mailer::reset_otp_mail(
            &user.email,
            self.config.mail_from_name(),
            &otp,
            self.config.otp_expiry_minutes(),
        );
        self.mailer.send(mail).await.map_err(|err| {
            error!("Failed to send OTP email: {err:#}");
            AuthError::Transport(err)
        })
    }

    /// Verify an OTP and set a new password.
    ///
    /// # Errors
    /// Validation failures, `InvalidOtp`, `UserNotFound`, or storage
    /// failures.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = validate::normalize_email(email);
        validate::validate_otp(otp)?;
        validate::validate_password(new_password)?;

        let otp_id = self
            .store
            .find_valid_otp(&email, otp)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidOtp)?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        let password_hash = password::hash_password(new_password).map_err(AuthError::Store)?;
        let updated = self
            .store
            .update_password(user.id, &password_hash)
            .await
            .map_err(AuthError::Store)?;
        if !updated {
            // OTP stays unused so the caller may retry.
            return Err(AuthError::UserNotFound);
        }

        // Guarded update loses the race when another reset spent this OTP.
        let consumed = self
            .store
            .mark_otp_used(otp_id)
            .await
            .map_err(AuthError::Store)?;
        if consumed {
            Ok(())
        } else {
            Err(AuthError::InvalidOtp)
        }
    }

    /// Resolve a session token to its user.
    ///
    /// # Errors
    /// `InvalidSession` for bad tokens, `UserNotFound` for deleted users.
    pub async fn current_user(&self, token: &str) -> Result<User, AuthError> {
        let user_id = session::verify(token, self.config.jwt_secret())?;
        self.store
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)
    }

    /// Mint a fresh session token from a still-valid one.
    ///
    /// # Errors
    /// `InvalidSession` when the presented token is not valid.
    pub async fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let user_id = session::verify(token, self.config.jwt_secret())?;
        session::mint(
            user_id,
            self.config.jwt_secret(),
            self.config.session_ttl_seconds(),
        )
        .map_err(AuthError::Store)
    }

    /// Provision a fresh TOTP secret and backup codes.
    ///
    /// Nothing is persisted; the enrollment only takes effect once
    /// [`Self::two_factor_enable`] confirms a code.
    ///
    /// # Errors
    /// `UserNotFound` or storage failures.
    pub async fn two_factor_setup(&self, user_id: Uuid) -> Result<TwoFactorSetup, AuthError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::UserNotFound)?;

        let secret = totp::generate_secret().map_err(AuthError::Store)?;
        let provisioning_uri =
            totp::provisioning_uri(&secret, self.config.totp_issuer(), &user.email)
                .map_err(AuthError::Store)?;
        let backup_codes =
            codes::generate_backup_codes(codes::BACKUP_CODE_COUNT).map_err(AuthError::Store)?;

        Ok(TwoFactorSetup {
            secret,
            provisioning_uri,
            backup_codes,
        })
    }

    /// Confirm a provisioned secret with a live code and enable 2FA.
    ///
    /// With `secret` present this persists a new enrollment (the supplied
    /// backup codes, or fresh ones, become the active set). Without it, a
    /// previously disabled credential is re-enabled against its stored
    /// secret.
    ///
    /// # Errors
    /// `InvalidTwoFactor` when the code does not verify or there is no
    /// credential to re-enable.
    pub async fn two_factor_enable(
        &self,
        user_id: Uuid,
        secret: Option<String>,
        code: &str,
        backup_codes: Option<Vec<String>>,
    ) -> Result<(), AuthError> {
        if let Some(secret) = secret {
            if !totp::verify_code(&secret, code) {
                return Err(AuthError::InvalidTwoFactor);
            }
            let backup_codes = match backup_codes {
                Some(codes) => codes,
                None => codes::generate_backup_codes(codes::BACKUP_CODE_COUNT)
                    .map_err(AuthError::Store)?,
            };
            return self
                .store
                .create_two_factor_enabled(user_id, &secret, &backup_codes)
                .await
                .map_err(AuthError::Store);
        }

        // Re-enable path: verify against the retained secret.
        let credential = self
            .store
            .find_two_factor(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidTwoFactor)?;
        if !totp::verify_code(&credential.secret, code) {
            return Err(AuthError::InvalidTwoFactor);
        }
        let enabled = self
            .store
            .set_two_factor_enabled(user_id, true)
            .await
            .map_err(AuthError::Store)?;
        if enabled {
            Ok(())
        } else {
            Err(AuthError::InvalidTwoFactor)
        }
    }

    /// Verify a TOTP code for an enabled credential. Fails closed when 2FA
    /// is not set up or disabled.
    ///
    /// # Errors
    /// `InvalidTwoFactor` on any mismatch.
    pub async fn two_factor_verify(&self, user_id: Uuid, code: &str) -> Result<(), AuthError> {
        let credential = self
            .store
            .find_two_factor(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidTwoFactor)?;
        if !credential.is_enabled {
            return Err(AuthError::InvalidTwoFactor);
        }
        if totp::verify_code(&credential.secret, code) {
            Ok(())
        } else {
            Err(AuthError::InvalidTwoFactor)
        }
    }

    /// Spend a backup code in place of a TOTP code.
    ///
    /// # Errors
    /// `InvalidTwoFactor` for unknown, already-spent or disabled codes.
    pub async fn two_factor_backup(&self, user_id: Uuid, code: &str) -> Result<(), AuthError> {
        let credential = self
            .store
            .find_two_factor(user_id)
            .await
            .map_err(AuthError::Store)?
            .ok_or(AuthError::InvalidTwoFactor)?;
        if !credential.is_enabled {
            return Err(AuthError::InvalidTwoFactor);
        }
        let consumed = self
            .store
            .consume_backup_code(user_id, code)
            .await
            .map_err(AuthError::Store)?;
        if consumed {
            Ok(())
        } else {
            Err(AuthError::InvalidTwoFactor)
        }
    }

    /// Disable 2FA. The secret and backup codes are retained for a later
    /// re-enable.
    ///
    /// # Errors
    /// `InvalidTwoFactor` when no credential exists.
    pub async fn two_factor_disable(&self, user_id: Uuid) -> Result<(), AuthError> {
        let disabled = self
            .store
            .set_two_factor_enabled(user_id, false)
            .await
            .map_err(AuthError::Store)?;
        if disabled {
            Ok(())
        } else {
            Err(AuthError::InvalidTwoFactor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::Mail;
    use crate::store::MemoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<Mail>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: Mail) -> anyhow::Result<()> {
            if self.fail {
                return Err(anyhow!("relay down"));
            }
            self.sent.lock().await.push(mail);
            Ok(())
        }
    }

    fn config() -> AuthConfig {
        AuthConfig::new(
            "http://localhost:3000".to_string(),
            SecretString::from("test-secret"),
        )
    }

    fn service_with(mailer: Arc<RecordingMailer>) -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), mailer, config())
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let service = service_with(Arc::new(RecordingMailer::new()));
        service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("first registration");
        let err = service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect_err("duplicate");
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn register_treats_email_case_as_distinct() {
        let service = service_with(Arc::new(RecordingMailer::new()));
        let first = service
            .register("User@Example.com", "SecurePass123!")
            .await
            .expect("first registration");
        let second = service
            .register("user@example.com", "SecurePass123!")
            .await
            .expect("case-distinct registration");
        assert_ne!(first.user_id, second.user_id);
        // Stored as given, minus surrounding whitespace.
        assert_eq!(first.email, "User@Example.com");
    }

    #[tokio::test]
    async fn register_succeeds_when_mail_fails() {
        let service = service_with(Arc::new(RecordingMailer::failing()));
        let outcome = service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("registration");
        assert!(!outcome.mail_delivered);
    }

    #[tokio::test]
    async fn login_requires_verified_email() {
        let mailer = Arc::new(RecordingMailer::new());
        let service = service_with(mailer.clone());
        service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("register");

        let err = service
            .login("a@example.com", "SecurePass123!")
            .await
            .expect_err("unverified login");
        assert!(matches!(err, AuthError::UnverifiedEmail));
    }

    #[tokio::test]
    async fn login_is_uniform_for_unknown_user_and_wrong_password() {
        let service = service_with(Arc::new(RecordingMailer::new()));
        service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("register");

        let unknown = service
            .login("nobody@example.com", "SecurePass123!")
            .await
            .expect_err("unknown");
        let wrong = service
            .login("a@example.com", "WrongPass123!")
            .await
            .expect_err("wrong password");
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::new());
        let service = service_with(mailer.clone());
        service
            .request_password_reset("ghost@example.com")
            .await
            .expect("opaque success");
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn two_factor_verify_fails_closed_without_enrollment() {
        let service = service_with(Arc::new(RecordingMailer::new()));
        let outcome = service
            .register("a@example.com", "SecurePass123!")
            .await
            .expect("register");
        let err = service
            .two_factor_verify(outcome.user_id, "123456")
            .await
            .expect_err("no enrollment");
        assert!(matches!(err, AuthError::InvalidTwoFactor));
    }
}
