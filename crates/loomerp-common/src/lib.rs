//! loomerp-common: shared types, errors and helpers used across all LoomERP crates.

pub mod error;
pub mod metrics;
pub mod roles;

// Re-export commonly used types
pub use error::{ApiError, ErpError};
pub use roles::Role;
