//! Sustainability audits: carbon footprint, ESG scoring and IGBC green
//! building ratings.
//!
//! [`models`] holds the typed inputs and the pure scoring rules; [`storage`]
//! persists computed audits per user.

pub mod models;
pub mod storage;

pub use models::AuditKind;
