//! Storage traits and entities for accounts and credentials.
//!
//! Handlers and the auth service only see these narrow traits; the Postgres
//! implementation lives in [`postgres`] and an in-memory one for tests in
//! [`memory`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TwoFactorCredential {
    pub user_id: Uuid,
    pub secret: String,
    pub is_enabled: bool,
    pub backup_codes: Vec<String>,
    pub used_backup_codes: Vec<String>,
}

/// Outcome of consuming an email verification token.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenConsume {
    /// Token matched a pending row and the user is now verified.
    Verified,
    /// Unknown, expired or already-consumed token.
    NotFound,
    /// Token matched but its user no longer exists; the token stays pending.
    UserMissing,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new unverified user. Returns `None` when the email is taken.
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Replace the stored password hash. Returns false if the user is gone.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool>;
}

#[async_trait]
pub trait VerificationTokenStore: Send + Sync {
    async fn insert_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Consume a pending token and mark its user verified in one step.
    async fn consume_verification_token(&self, token: &str) -> Result<TokenConsume>;

    /// Drop expired pending tokens. Returns the number removed.
    async fn purge_expired_tokens(&self) -> Result<u64>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn insert_reset_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid>;

    /// Find an unused, unexpired OTP matching email and code.
    async fn find_valid_otp(&self, email: &str, code: &str) -> Result<Option<Uuid>>;

    /// Mark an OTP used. Returns false when it was already used or is gone,
    /// so concurrent resets cannot both succeed on the same code.
    async fn mark_otp_used(&self, id: Uuid) -> Result<bool>;

    /// Drop expired unused OTPs. Returns the number removed.
    async fn purge_expired_otps(&self) -> Result<u64>;
}

#[async_trait]
pub trait TwoFactorStore: Send + Sync {
    async fn find_two_factor(&self, user_id: Uuid) -> Result<Option<TwoFactorCredential>>;

    /// Persist a freshly verified enrollment and flip the user flag, in one
    /// step. Replaces any previous credential for the user.
    async fn create_two_factor_enabled(
        &self,
        user_id: Uuid,
        secret: &str,
        backup_codes: &[String],
    ) -> Result<()>;

    /// Toggle an existing credential and the user flag together. Returns
    /// false when the user has no credential.
    async fn set_two_factor_enabled(&self, user_id: Uuid, enabled: bool) -> Result<bool>;

    /// Spend a backup code. Returns false for unknown or already-used codes.
    async fn consume_backup_code(&self, user_id: Uuid, code: &str) -> Result<bool>;
}

/// Everything the auth service needs from storage.
pub trait AuthStore: UserStore + VerificationTokenStore + OtpStore + TwoFactorStore {}

impl<T: UserStore + VerificationTokenStore + OtpStore + TwoFactorStore> AuthStore for T {}
