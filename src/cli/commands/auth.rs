//! Auth and mail related arguments.

use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_OTP_EXPIRY_MINUTES: &str = "otp-expiry-minutes";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_TOTP_ISSUER: &str = "totp-issuer";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_MAIL_FROM_NAME: &str = "mail-from-name";
pub const ARG_REAPER_INTERVAL_SECONDS: &str = "reaper-interval-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Base URL of the frontend, used for email verification links and CORS")
                .default_value("http://localhost:3000")
                .env("GREENLEDGER_FRONTEND_BASE_URL"),
        )
        .arg(
            Arg::new(ARG_OTP_EXPIRY_MINUTES)
                .long(ARG_OTP_EXPIRY_MINUTES)
                .help("Password reset OTP lifetime in minutes")
                .default_value("10")
                .env("GREENLEDGER_OTP_EXPIRY_MINUTES")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token lifetime in seconds")
                .default_value("3600")
                .env("GREENLEDGER_SESSION_TTL_SECONDS")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_TOTP_ISSUER)
                .long(ARG_TOTP_ISSUER)
                .help("Issuer name embedded in TOTP provisioning URIs")
                .default_value("GreenLedger")
                .env("GREENLEDGER_TOTP_ISSUER"),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HS256 signing key for session tokens")
                .env("GREENLEDGER_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_MAIL_FROM_NAME)
                .long(ARG_MAIL_FROM_NAME)
                .help("Display name used in outbound email bodies")
                .default_value("GreenLedger")
                .env("GREENLEDGER_MAIL_FROM_NAME"),
        )
        .arg(
            Arg::new(ARG_REAPER_INTERVAL_SECONDS)
                .long(ARG_REAPER_INTERVAL_SECONDS)
                .help("Interval between passive cleanup sweeps of expired tokens and OTPs")
                .default_value("300")
                .env("GREENLEDGER_REAPER_INTERVAL_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Auth options parsed from CLI matches.
#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub otp_expiry_minutes: i64,
    pub session_ttl_seconds: i64,
    pub totp_issuer: String,
    pub jwt_secret: String,
    pub mail_from_name: String,
    pub reaper_interval_seconds: u64,
}

impl Options {
    /// Extract auth options from parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            otp_expiry_minutes: matches
                .get_one::<i64>(ARG_OTP_EXPIRY_MINUTES)
                .copied()
                .unwrap_or(10),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(3600),
            totp_issuer: matches
                .get_one::<String>(ARG_TOTP_ISSUER)
                .cloned()
                .unwrap_or_else(|| "GreenLedger".to_string()),
            jwt_secret: matches
                .get_one::<String>(ARG_JWT_SECRET)
                .cloned()
                .context("missing required argument: --jwt-secret")?,
            mail_from_name: matches
                .get_one::<String>(ARG_MAIL_FROM_NAME)
                .cloned()
                .unwrap_or_else(|| "GreenLedger".to_string()),
            reaper_interval_seconds: matches
                .get_one::<u64>(ARG_REAPER_INTERVAL_SECONDS)
                .copied()
                .unwrap_or(300),
        })
    }
}
