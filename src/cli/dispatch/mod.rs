//! Command-line argument dispatch and server initialization.
//!
//! This module maps validated CLI arguments to the appropriate action, such
//! as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        frontend_base_url: auth_opts.frontend_base_url,
        otp_expiry_minutes: auth_opts.otp_expiry_minutes,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        totp_issuer: auth_opts.totp_issuer,
        jwt_secret: auth_opts.jwt_secret,
        mail_from_name: auth_opts.mail_from_name,
        reaper_interval_seconds: auth_opts.reaper_interval_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn handler_builds_server_action() {
        temp_env::with_vars(
            [
                ("GREENLEDGER_JWT_SECRET", Some("test-secret")),
                ("GREENLEDGER_OTP_EXPIRY_MINUTES", Some("5")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "greenledger",
                    "--dsn",
                    "postgres://user@localhost:5432/greenledger",
                ]);
                let action = handler(&matches).expect("server action");
                let Action::Server(args) = action;
                assert_eq!(args.port, 8080);
                assert_eq!(args.otp_expiry_minutes, 5);
                assert_eq!(args.session_ttl_seconds, 3600);
                assert_eq!(args.jwt_secret, "test-secret");
            },
        );
    }
}
