use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{configs, health},
    server::ConfigraServer,
};

pub mod paths {
    pub const API_V1: &str = "/v1";
}

/// Landing page and health check (no authentication)
pub fn health_routes() -> Router<ConfigraServer> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
}

/// Configuration routes; everything except `/validate` requires an API key
pub fn config_routes() -> Router<ConfigraServer> {
    Router::new()
        .route("/validate", post(configs::validate))
        .route(
            "/configs",
            post(configs::create_config).get(configs::get_config),
        )
        .route("/configs/versions", get(configs::list_versions))
        .route("/rollback", post(configs::rollback_config))
}

pub fn create_routes() -> Router<ConfigraServer> {
    Router::new()
        .merge(health_routes())
        .nest(paths::API_V1, config_routes())
}
