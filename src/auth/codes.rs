//! Random code and token generation.
//!
//! All randomness comes from the operating system RNG. Raw values are only
//! returned to the caller; what storage keeps is up to the store layer.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{Rng, RngCore, rngs::OsRng};

/// Number of backup codes issued per 2FA enrollment.
pub const BACKUP_CODE_COUNT: usize = 10;

/// Generate a 6 digit one-time password for password reset emails.
#[must_use]
pub fn generate_otp() -> String {
    let mut rng = OsRng;
    (0..6)
        .map(|_| char::from(b'0' + rng.gen_range(0..10)))
        .collect()
}

/// Create a new verification token for email links.
///
/// # Errors
/// Returns an error if the OS RNG fails.
pub fn generate_verification_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate verification token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Generate backup codes for account recovery, 8 hex chars each.
///
/// # Errors
/// Returns an error if the OS RNG fails.
pub fn generate_backup_codes(count: usize) -> Result<Vec<String>> {
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 4];
            OsRng
                .try_fill_bytes(&mut bytes)
                .context("failed to generate backup code")?;
            Ok(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
        })
        .collect()
}
