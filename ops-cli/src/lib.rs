//! Command-line tooling for Configra
//!
//! The `configra` binary validates configuration files locally, drives the
//! HTTP API (push, fetch, history, rollback) and performs the database
//! chores that have no HTTP surface (migrations, project registration).
//!
//! ```bash
//! configra validate --schema schema.json --config config.json
//! configra push --file config.json --schema schema.json --env 1 --key feature_flags
//! configra rollback --env 1 --key feature_flags --version 3
//! configra project create --name storefront --owner-id 42
//! ```

pub mod client;
pub mod commands;

pub use client::ApiClient;
