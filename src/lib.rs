//! # GreenLedger (Sustainability Audit Platform)
//!
//! `greenledger` is the backend for a sustainability audit platform. It owns
//! user accounts and the full credential lifecycle, and stores scored
//! sustainability audits (carbon emissions, ESG, green building).
//!
//! ## Accounts & Credentials
//!
//! - **Registration** creates an unverified account and emails a single-use
//!   verification link (24h lifetime). Login is refused until the email is
//!   confirmed.
//! - **Password reset** is driven by a 6-digit one-time code emailed to the
//!   account address, valid for a configurable number of minutes and
//!   consumable exactly once.
//! - **Two-factor authentication** uses TOTP (RFC 6238, 30s steps, ±1 step
//!   clock-drift tolerance) with ten single-use hex backup codes. The TOTP
//!   secret is only persisted once the user has proven possession of it.
//! - **Sessions** are stateless HS256 JWTs bound to the user id.
//!
//! Lookups that could reveal account existence (login, password-reset
//! request, token/OTP consumption) answer with deliberately generic
//! messages.
//!
//! ## Audits
//!
//! Audit inputs are explicit typed numeric records, clamped to their
//! documented ranges; scores and ratings are computed server-side and stored
//! alongside the inputs.

pub mod api;
pub mod audits;
pub mod auth;
pub mod cli;
pub mod mailer;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
