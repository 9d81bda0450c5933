//! Configra Server - schema-validated, versioned configuration API
//!
//! This library provides the HTTP surface of Configra: API-key
//! authentication, the configuration endpoints and the health check.
//! Business rules live in `config-engine` and `database-layer`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod settings;

// Re-export commonly used types
pub use error::*;
pub use server::ConfigraServer;
pub use settings::{Settings, StorageBackend};

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: ConfigraServer) -> Router {
    routes::create_routes()
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(server)
}
