use crate::{api, auth::service::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub frontend_base_url: String,
    pub otp_expiry_minutes: i64,
    pub session_ttl_seconds: i64,
    pub totp_issuer: String,
    pub jwt_secret: String,
    pub mail_from_name: String,
    pub reaper_interval_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(
        args.frontend_base_url,
        SecretString::from(args.jwt_secret),
    )
    .with_otp_expiry_minutes(args.otp_expiry_minutes)
    .with_session_ttl_seconds(args.session_ttl_seconds)
    .with_totp_issuer(args.totp_issuer)
    .with_mail_from_name(args.mail_from_name);

    api::new(args.port, args.dsn, auth_config, args.reaper_interval_seconds).await
}
