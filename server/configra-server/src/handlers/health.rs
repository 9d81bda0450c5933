use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::server::ConfigraServer;
use crate::settings::StorageBackend;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the store answers, `degraded` otherwise
    pub status: &'static str,
    pub storage: &'static str,
    pub version: &'static str,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}

pub async fn health_check(State(server): State<ConfigraServer>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = server.service.is_healthy().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        storage: match server.backend {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (status, Json(body))
}

/// Landing document for browsers hitting the bare host
pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Configra API",
        "status": "running",
        "docs": "This is a JSON-only API. Use the CLI or API endpoints.",
        "endpoints": [
            "GET /health",
            "POST /v1/validate",
            "POST /v1/configs",
            "GET /v1/configs?env_id=&key=",
            "GET /v1/configs/versions?env_id=&key=",
            "POST /v1/rollback"
        ]
    }))
}
