//! Account and credential management.
//!
//! Registration, email verification, password reset via OTP, TOTP based
//! two-factor authentication and JWT session minting. The [`service`]
//! module orchestrates these pieces over the storage traits in
//! [`crate::store`].

pub mod codes;
pub mod error;
pub mod password;
pub mod service;
pub mod session;
pub mod totp;
pub mod validate;

pub use error::AuthError;
pub use service::{AuthConfig, AuthService};
