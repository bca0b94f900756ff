//! HTTP client module for the Smart Imobiliário portal.
//!
//! The portal exposes exactly two API-shaped operations to the mobile
//! client: a form-encoded login POST and a form-encoded password-recovery
//! POST. Everything else the user does happens inside the embedded browser
//! surface. The portal is the sole arbiter of credential validity; any
//! non-success status is a credential failure, not something to retry.

pub mod client;
pub mod error;

pub use client::PortalClient;
pub use error::{AuthError, RecoveryError};
