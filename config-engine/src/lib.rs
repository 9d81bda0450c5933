//! Schema validation and orchestration for Configra
//!
//! This crate sits between the HTTP surface and the versioned store:
//! - **Schema model**: flat field rules (`string`, `int`, `float`, `bool`,
//!   `enum`, `json`) with requiredness, defaults, bounds and allowed values
//! - **Schema Validator**: pure, non-fail-fast payload checking
//! - **Deep-lint client**: optional remote re-validation over HTTP
//! - **Orchestration**: validate → lint → persist
//!
//! # Example
//!
//! ```rust
//! use config_engine::ConfigService;
//! use database_layer::{ConfigKey, InMemoryConfigStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), config_engine::ConfigError> {
//! let service = ConfigService::new(Arc::new(InMemoryConfigStore::new()));
//! let schema = json!({
//!     "version": 1,
//!     "rules": {
//!         "feature_enabled": {"type": "bool", "required": true},
//!         "region": {"type": "enum", "allowed": ["us-east", "eu-west"], "default": "us-east"}
//!     }
//! });
//!
//! let key = ConfigKey::new(1, 1, "checkout");
//! let created = service
//!     .create_config(&key, &json!({"feature_enabled": true}), &schema, "project:1")
//!     .await?;
//!
//! assert_eq!(created.version, 1);
//! assert_eq!(created.data["region"], "us-east");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lint;
pub mod schema;
pub mod service;
pub mod validation;

pub use error::*;
pub use lint::{DeepLinter, HttpDeepLinter, LintError, LintPolicy, LintVerdict, DEFAULT_LINT_TIMEOUT};
pub use schema::{FieldRule, FieldType, Schema};
pub use service::ConfigService;
pub use validation::{validate, validate_document, Payload};
