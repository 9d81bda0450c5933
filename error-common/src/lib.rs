//! Common error handling utilities for Configra
//!
//! This crate holds the error vocabulary shared by every Configra module:
//!
//! - **`ValidationErrors`**: the single compound error produced when a
//!   configuration payload does not satisfy its schema. It carries every
//!   violation, in order, so callers can enumerate all of them.
//! - **Error codes**: stable, machine-readable codes for API responses.
//! - **`ConfigraError`**: a coarse top-level error used by binaries.
//!
//! # Example
//!
//! ```rust
//! use error_common::ValidationErrors;
//!
//! let mut errors = ValidationErrors::new();
//! errors.push("field 'region' is required");
//! errors.push("unknown field 'colour' is not allowed by schema");
//!
//! assert_eq!(errors.len(), 2);
//! assert_eq!(
//!     errors.to_string(),
//!     "validation failed: field 'region' is required; unknown field 'colour' is not allowed by schema"
//! );
//! ```

pub mod codes;
pub mod types;

pub use codes::ErrorCode;
pub use types::*;
