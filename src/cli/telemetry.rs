//! Tracing subscriber setup.
//!
//! The verbosity flag takes precedence; otherwise `RUST_LOG` is honored and
//! the fallback is `error`. Set `GREENLEDGER_LOG_FORMAT=json` for JSON lines
//! output (one event per line, suitable for log shippers).

use anyhow::Result;
use std::env::var;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const ENV_LOG_FORMAT: &str = "GREENLEDGER_LOG_FORMAT";

fn build_filter(level: Option<Level>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
    }
}

fn json_output() -> bool {
    var(ENV_LOG_FORMAT).is_ok_and(|format| format.eq_ignore_ascii_case("json"))
}

/// Initialize the global tracing subscriber.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(level: Option<Level>) -> Result<()> {
    let filter = build_filter(level);

    if json_output() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?;
    }

    Ok(())
}
