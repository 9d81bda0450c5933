//! Versioned configuration store for Configra
//!
//! This crate owns all persistent configuration state. A configuration is
//! a logical record identified by `(project_id, environment_id, key)`; its
//! content lives in an append-only list of immutable version snapshots.
//!
//! # Storage model
//!
//! - **`configs`**: one row per composite key, holding the current-version
//!   pointer and timestamps.
//! - **`config_versions`**: append-only snapshots, unique on
//!   `(config_id, version)`. Rows are never updated or deleted.
//!
//! Every write (create, update, rollback) appends exactly one version at
//! `head + 1`. Rollback copies an older snapshot's `data`/`schema` into a
//! new version instead of touching history.
//!
//! # Concurrency
//!
//! Writers to the same composite key are serialised for the duration of
//! the write: the PostgreSQL backend holds the row lock on the `configs`
//! row (taken by the upsert or by `SELECT ... FOR UPDATE`) until the
//! version insert commits; the in-memory backend holds a per-key mutex.
//! Writers to different keys never contend.
//!
//! # Example
//!
//! ```rust
//! use database_layer::{ConfigKey, ConfigStore, InMemoryConfigStore};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), database_layer::DatabaseError> {
//! let store = InMemoryConfigStore::new();
//! let key = ConfigKey::new(1, 1, "feature_flags");
//!
//! store.create_or_update(&key, json!({"beta": false}), json!({}), "alice").await?;
//! store.create_or_update(&key, json!({"beta": true}), json!({}), "alice").await?;
//!
//! let restored = store.rollback(&key, 1, "bob").await?;
//! assert_eq!(restored.version, 3);
//! assert_eq!(restored.data, json!({"beta": false}));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod projects;
pub mod repository;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use projects::*;
pub use repository::postgres::PgConfigStore;
pub use repository::{ConfigStore, InMemoryConfigStore};
