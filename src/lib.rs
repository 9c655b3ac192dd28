//! OpsHub Access - Authorization core for the OpsHub automation platform
//!
//! This crate provides the access-control decision layer used by the OpsHub
//! API: per-object-type policies (can_add / can_change / can_read /
//! can_delete), the sensitive-field diff engine that scopes update
//! re-authorization to the references that actually changed, and the
//! configuration-field validators for external authentication providers.

pub mod access;
pub mod domain;
pub mod error;
pub mod sso;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use access::AccessRegistry;
pub use error::{AppError, Result};
