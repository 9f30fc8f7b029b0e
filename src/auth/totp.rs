//! TOTP primitives for two-factor authentication.
//!
//! RFC 6238 with SHA-1, 6 digits, 30 second steps and a ±1 step tolerance
//! for clock drift. Secrets are stored base32 encoded.

use anyhow::{Context, Result, anyhow};
use rand::{RngCore, rngs::OsRng};
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// Generate a fresh base32-encoded TOTP secret.
///
/// # Errors
/// Returns an error if the OS RNG fails.
pub fn generate_secret() -> Result<String> {
    let mut bytes = [0u8; 20];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate TOTP secret")?;
    Ok(build(&bytes, None, String::new())?.get_secret_base32())
}

/// Build the otpauth:// provisioning URI for authenticator apps.
///
/// # Errors
/// Returns an error if the secret does not decode or the account name is
/// rejected by the URI rules.
pub fn provisioning_uri(secret_base32: &str, issuer: &str, account: &str) -> Result<String> {
    let totp = from_secret(secret_base32, Some(issuer.to_string()), account.to_string())?;
    Ok(totp.get_url())
}

/// Check a code against the secret at the current time, with ±1 step skew.
#[must_use]
pub fn verify_code(secret_base32: &str, code: &str) -> bool {
    match from_secret(secret_base32, None, String::new()) {
        Ok(totp) => totp.check_current(code).unwrap_or(false),
        Err(_) => false,
    }
}

/// Check a code at an explicit Unix timestamp, with ±1 step skew.
#[must_use]
pub fn verify_code_at(secret_base32: &str, code: &str, timestamp: u64) -> bool {
    match from_secret(secret_base32, None, String::new()) {
        Ok(totp) => totp.check(code, timestamp),
        Err(_) => false,
    }
}

/// Generate the code for an explicit Unix timestamp.
///
/// # Errors
/// Returns an error if the secret does not decode.
pub fn code_at(secret_base32: &str, timestamp: u64) -> Result<String> {
    Ok(from_secret(secret_base32, None, String::new())?.generate(timestamp))
}

fn from_secret(secret_base32: &str, issuer: Option<String>, account: String) -> Result<TOTP> {
    let bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|err| anyhow!("invalid TOTP secret: {err:?}"))?;
    build(&bytes, issuer, account)
}

fn build(secret: &[u8], issuer: Option<String>, account: String) -> Result<TOTP> {
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret.to_vec(),
        issuer,
        account,
    )
    .map_err(|err| anyhow!("failed to build TOTP: {err:?}"))
}
