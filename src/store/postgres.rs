//! Postgres-backed store.

use super::{
    OtpStore, TokenConsume, TwoFactorCredential, TwoFactorStore, User, UserStore,
    VerificationTokenStore,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::{sync::Arc, time::Duration};
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        is_verified: row.get("is_verified"),
        two_factor_enabled: row.get("two_factor_enabled"),
        created_at: row.get("created_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, is_active, is_verified, two_factor_enabled, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Option<User>> {
        let query = &format!(
            r"
        INSERT INTO users
            (email, password_hash)
        VALUES ($1, $2)
        RETURNING {USER_COLUMNS}
    "
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(Some(user_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(None),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = &format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find user by email")?;
        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find user by id")?;
        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password")?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl VerificationTokenStore for PgStore {
    async fn insert_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = r"
        INSERT INTO email_verification_tokens
            (email, token, expires_at)
        VALUES ($1, $2, $3)
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(email)
            .bind(token)
            .bind(expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert email verification token")?;
        Ok(())
    }

    async fn consume_verification_token(&self, token: &str) -> Result<TokenConsume> {
        // Transaction keeps the token flip and the user flag consistent. A
        // token whose user is gone stays pending (nothing to verify yet).
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin verify-email transaction")?;

        let query = r"
        SELECT email FROM email_verification_tokens
        WHERE token = $1 AND NOT is_verified AND expires_at > NOW()
        FOR UPDATE
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lookup verification token")?;

        let Some(row) = row else {
            let _ = tx.rollback().await;
            return Ok(TokenConsume::NotFound);
        };
        let email: String = row.get("email");

        let query = "UPDATE users SET is_verified = TRUE WHERE email = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&email)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to mark user verified")?;

        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Ok(TokenConsume::UserMissing);
        }

        let query = "UPDATE email_verification_tokens SET is_verified = TRUE WHERE token = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(token)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to mark verification token consumed")?;

        tx.commit().await.context("commit verify-email transaction")?;
        Ok(TokenConsume::Verified)
    }

    async fn purge_expired_tokens(&self) -> Result<u64> {
        // Consumed rows go too once past expiry; nothing reads them after.
        let query = "DELETE FROM email_verification_tokens WHERE expires_at <= NOW()";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired verification tokens")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OtpStore for PgStore {
    async fn insert_reset_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let query = r"
        INSERT INTO password_reset_otps
            (email, code, expires_at)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(code)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to insert password reset OTP")?;
        Ok(row.get("id"))
    }

    async fn find_valid_otp(&self, email: &str, code: &str) -> Result<Option<Uuid>> {
        let query = r"
        SELECT id FROM password_reset_otps
        WHERE email = $1 AND code = $2 AND NOT used AND expires_at > NOW()
        ORDER BY created_at DESC
        LIMIT 1
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(code)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find valid OTP")?;
        Ok(row.map(|row| row.get("id")))
    }

    async fn mark_otp_used(&self, id: Uuid) -> Result<bool> {
        // Guarded update so two concurrent resets cannot spend the same OTP.
        let query = "UPDATE password_reset_otps SET used = TRUE WHERE id = $1 AND NOT used";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to mark OTP used")?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired_otps(&self) -> Result<u64> {
        let query = "DELETE FROM password_reset_otps WHERE expires_at <= NOW()";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired OTPs")?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TwoFactorStore for PgStore {
    async fn find_two_factor(&self, user_id: Uuid) -> Result<Option<TwoFactorCredential>> {
        let query = r"
        SELECT user_id, secret, is_enabled, backup_codes, used_backup_codes
        FROM two_factor_credentials
        WHERE user_id = $1
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find 2FA credential")?;

        Ok(row.map(|row| TwoFactorCredential {
            user_id: row.get("user_id"),
            secret: row.get("secret"),
            is_enabled: row.get("is_enabled"),
            backup_codes: row.get("backup_codes"),
            used_backup_codes: row.get("used_backup_codes"),
        }))
    }

    async fn create_two_factor_enabled(
        &self,
        user_id: Uuid,
        secret: &str,
        backup_codes: &[String],
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin 2FA enroll transaction")?;

        let query = r"
        INSERT INTO two_factor_credentials
            (user_id, secret, is_enabled, backup_codes, used_backup_codes)
        VALUES ($1, $2, TRUE, $3, '{}')
        ON CONFLICT (user_id) DO UPDATE SET
            secret = EXCLUDED.secret,
            is_enabled = TRUE,
            backup_codes = EXCLUDED.backup_codes,
            used_backup_codes = '{}',
            updated_at = NOW()
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(secret)
            .bind(backup_codes)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to upsert 2FA credential")?;

        let query = "UPDATE users SET two_factor_enabled = TRUE WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to flag user 2FA enabled")?;

        tx.commit().await.context("commit 2FA enroll transaction")?;
        Ok(())
    }

    async fn set_two_factor_enabled(&self, user_id: Uuid, enabled: bool) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin 2FA toggle transaction")?;

        let query =
            "UPDATE two_factor_credentials SET is_enabled = $2, updated_at = NOW() WHERE user_id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(enabled)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to toggle 2FA credential")?;

        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Ok(false);
        }

        let query = "UPDATE users SET two_factor_enabled = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(user_id)
            .bind(enabled)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to flag user 2FA state")?;

        tx.commit().await.context("commit 2FA toggle transaction")?;
        Ok(true)
    }

    async fn consume_backup_code(&self, user_id: Uuid, code: &str) -> Result<bool> {
        // Single guarded update: the code must be issued and not yet spent.
        let query = r"
        UPDATE two_factor_credentials
        SET used_backup_codes = array_append(used_backup_codes, $2), updated_at = NOW()
        WHERE user_id = $1
          AND $2 = ANY(backup_codes)
          AND NOT ($2 = ANY(used_backup_codes))
    ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(code)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to consume backup code")?;
        Ok(result.rows_affected() == 1)
    }
}

/// Periodically delete expired verification tokens and OTPs.
///
/// Expired rows are already invisible to lookups; this only keeps the tables
/// from growing without bound.
pub fn spawn_expiry_reaper(store: Arc<PgStore>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match store.purge_expired_tokens().await {
                Ok(purged) if purged > 0 => debug!("Purged {purged} expired verification tokens"),
                Ok(_) => {}
                Err(err) => error!("Failed to purge expired verification tokens: {err:#}"),
            }

            match store.purge_expired_otps().await {
                Ok(purged) if purged > 0 => debug!("Purged {purged} expired OTPs"),
                Ok(_) => {}
                Err(err) => error!("Failed to purge expired OTPs: {err:#}"),
            }
        }
    });
}
