//! In-memory store used by unit and integration tests.

use super::{
    OtpStore, TokenConsume, TwoFactorCredential, TwoFactorStore, User, UserStore,
    VerificationTokenStore,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

struct TokenRow {
    email: String,
    token: String,
    expires_at: DateTime<Utc>,
    is_verified: bool,
}

struct OtpRow {
    id: Uuid,
    email: String,
    code: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    tokens: Vec<TokenRow>,
    otps: Vec<OtpRow>,
    two_factor: Vec<TwoFactorCredential>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|user| user.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            is_verified: false,
            two_factor_enabled: false,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl VerificationTokenStore for MemoryStore {
    async fn insert_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.tokens.push(TokenRow {
            email: email.to_string(),
            token: token.to_string(),
            expires_at,
            is_verified: false,
        });
        Ok(())
    }

    async fn consume_verification_token(&self, token: &str) -> Result<TokenConsume> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let Some(position) = inner
            .tokens
            .iter()
            .position(|row| row.token == token && !row.is_verified && row.expires_at > now)
        else {
            return Ok(TokenConsume::NotFound);
        };
        let email = inner.tokens[position].email.clone();
        let Some(user_position) = inner.users.iter().position(|user| user.email == email) else {
            return Ok(TokenConsume::UserMissing);
        };
        inner.users[user_position].is_verified = true;
        inner.tokens[position].is_verified = true;
        Ok(TokenConsume::Verified)
    }

    async fn purge_expired_tokens(&self) -> Result<u64> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let before = inner.tokens.len();
        inner.tokens.retain(|row| row.expires_at > now);
        Ok((before - inner.tokens.len()) as u64)
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn insert_reset_otp(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let mut inner = self.inner.lock().await;
        let id = Uuid::new_v4();
        inner.otps.push(OtpRow {
            id,
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            used: false,
        });
        Ok(id)
    }

    async fn find_valid_otp(&self, email: &str, code: &str) -> Result<Option<Uuid>> {
        let now = Utc::now();
        let inner = self.inner.lock().await;
        Ok(inner
            .otps
            .iter()
            .find(|row| row.email == email && row.code == code && !row.used && row.expires_at > now)
            .map(|row| row.id))
    }

    async fn mark_otp_used(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        match inner.otps.iter_mut().find(|row| row.id == id && !row.used) {
            Some(row) => {
                row.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired_otps(&self) -> Result<u64> {
        let now = Utc::now();
        let mut inner = self.inner.lock().await;
        let before = inner.otps.len();
        inner.otps.retain(|row| row.expires_at > now);
        Ok((before - inner.otps.len()) as u64)
    }
}

#[async_trait]
impl TwoFactorStore for MemoryStore {
    async fn find_two_factor(&self, user_id: Uuid) -> Result<Option<TwoFactorCredential>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .two_factor
            .iter()
            .find(|credential| credential.user_id == user_id)
            .cloned())
    }

    async fn create_two_factor_enabled(
        &self,
        user_id: Uuid,
        secret: &str,
        backup_codes: &[String],
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .two_factor
            .retain(|credential| credential.user_id != user_id);
        inner.two_factor.push(TwoFactorCredential {
            user_id,
            secret: secret.to_string(),
            is_enabled: true,
            backup_codes: backup_codes.to_vec(),
            used_backup_codes: Vec::new(),
        });
        if let Some(user) = inner.users.iter_mut().find(|user| user.id == user_id) {
            user.two_factor_enabled = true;
        }
        Ok(())
    }

    async fn set_two_factor_enabled(&self, user_id: Uuid, enabled: bool) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let found = match inner
            .two_factor
            .iter_mut()
            .find(|credential| credential.user_id == user_id)
        {
            Some(credential) => {
                credential.is_enabled = enabled;
                true
            }
            None => false,
        };
        if found {
            if let Some(user) = inner.users.iter_mut().find(|user| user.id == user_id) {
                user.two_factor_enabled = enabled;
            }
        }
        Ok(found)
    }

    async fn consume_backup_code(&self, user_id: Uuid, code: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Some(credential) = inner
            .two_factor
            .iter_mut()
            .find(|credential| credential.user_id == user_id)
        else {
            return Ok(false);
        };
        if !credential.backup_codes.iter().any(|issued| issued == code) {
            return Ok(false);
        }
        if credential.used_backup_codes.iter().any(|used| used == code) {
            return Ok(false);
        }
        credential.used_backup_codes.push(code.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = store.insert_user("a@example.com", "hash").await.unwrap();
        assert!(first.is_some());
        let second = store.insert_user("a@example.com", "hash").await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn token_consume_is_single_use() {
        let store = MemoryStore::new();
        store.insert_user("a@example.com", "hash").await.unwrap();
        store
            .insert_verification_token("a@example.com", "tok", Utc::now() + Duration::hours(24))
            .await
            .unwrap();

        assert_eq!(
            store.consume_verification_token("tok").await.unwrap(),
            TokenConsume::Verified
        );
        assert_eq!(
            store.consume_verification_token("tok").await.unwrap(),
            TokenConsume::NotFound
        );
    }

    #[tokio::test]
    async fn expired_token_is_not_found() {
        let store = MemoryStore::new();
        store.insert_user("a@example.com", "hash").await.unwrap();
        store
            .insert_verification_token("a@example.com", "tok", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(
            store.consume_verification_token("tok").await.unwrap(),
            TokenConsume::NotFound
        );
    }

    #[tokio::test]
    async fn token_without_user_stays_pending() {
        let store = MemoryStore::new();
        store
            .insert_verification_token("ghost@example.com", "tok", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(
            store.consume_verification_token("tok").await.unwrap(),
            TokenConsume::UserMissing
        );
        // Still pending, so a later attempt sees the same outcome.
        assert_eq!(
            store.consume_verification_token("tok").await.unwrap(),
            TokenConsume::UserMissing
        );
    }

    #[tokio::test]
    async fn otp_mark_used_is_single_shot() {
        let store = MemoryStore::new();
        let id = store
            .insert_reset_otp("a@example.com", "123456", Utc::now() + Duration::minutes(10))
            .await
            .unwrap();
        assert!(store.mark_otp_used(id).await.unwrap());
        assert!(!store.mark_otp_used(id).await.unwrap());
        assert_eq!(
            store.find_valid_otp("a@example.com", "123456").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn backup_code_single_use() {
        let store = MemoryStore::new();
        let user = store
            .insert_user("a@example.com", "hash")
            .await
            .unwrap()
            .unwrap();
        let codes = vec!["aabbccdd".to_string(), "11223344".to_string()];
        store
            .create_two_factor_enabled(user.id, "SECRET", &codes)
            .await
            .unwrap();

        assert!(store.consume_backup_code(user.id, "aabbccdd").await.unwrap());
        assert!(!store.consume_backup_code(user.id, "aabbccdd").await.unwrap());
        assert!(!store.consume_backup_code(user.id, "unknown0").await.unwrap());
    }

    #[tokio::test]
    async fn purge_removes_expired_rows_and_keeps_live_ones() {
        let store = MemoryStore::new();
        store
            .insert_verification_token("a@example.com", "old", Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        store
            .insert_verification_token("a@example.com", "new", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .insert_reset_otp("a@example.com", "123456", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(store.purge_expired_tokens().await.unwrap(), 1);
        assert_eq!(store.purge_expired_otps().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn purge_collects_spent_rows_once_past_expiry() {
        let store = MemoryStore::new();
        let id = store
            .insert_reset_otp("a@example.com", "123456", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        // Spent and past expiry: nothing reads this row again.
        assert!(store.mark_otp_used(id).await.unwrap());
        assert_eq!(store.purge_expired_otps().await.unwrap(), 1);

        // A spent row still inside its lifetime is kept.
        let id = store
            .insert_reset_otp("a@example.com", "654321", Utc::now() + Duration::minutes(10))
            .await
            .unwrap();
        assert!(store.mark_otp_used(id).await.unwrap());
        assert_eq!(store.purge_expired_otps().await.unwrap(), 0);
    }
}
