//! Password hashing with bcrypt.

use anyhow::{Context, Result};

/// Work factor for bcrypt hashing.
const BCRYPT_COST: u32 = 12;

/// Hash a plaintext password for storage.
///
/// # Errors
/// Returns an error if bcrypt fails (e.g. the password exceeds 72 bytes).
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("failed to hash password")
}

/// Check a plaintext password against a stored hash.
///
/// Malformed stored hashes count as a mismatch rather than an error so the
/// login path stays uniform.
#[must_use]
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("SecurePass123!").expect("hash");
        assert!(verify_password("SecurePass123!", &hash));
        assert!(!verify_password("WrongPass123!", &hash));
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!verify_password("SecurePass123!", "not-a-bcrypt-hash"));
    }
}
