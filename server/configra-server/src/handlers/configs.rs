use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use database_layer::{ConfigKey, ConfigVersion, DatabaseError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::middleware::ProjectScope;
use crate::server::ConfigraServer;

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default = "empty_object")]
    pub schema: Value,
    #[serde(default = "empty_object")]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Accepted for compatibility; the authenticated project always wins
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub env_id: i64,
    #[serde(default)]
    pub key: String,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default = "empty_object")]
    pub schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub env_id: i64,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub target_version: i32,
}

#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    pub env_id: i64,
    pub key: String,
    /// Restrict a history read to one version
    pub version: Option<i32>,
}

fn missing_fields() -> ApiError {
    ApiError::bad_request("missing required fields")
}

fn scoped_key(scope: &ProjectScope, env_id: i64, key: &str) -> ApiResult<ConfigKey> {
    if env_id == 0 || key.is_empty() {
        return Err(missing_fields());
    }
    Ok(ConfigKey::new(scope.project_id, env_id, key))
}

fn not_found(key: &ConfigKey) -> ApiError {
    ApiError::config_not_found(
        DatabaseError::ConfigNotFound {
            project_id: key.project_id,
            env_id: key.env_id,
            key: key.key.clone(),
        }
        .to_string(),
    )
}

/// Check a payload against a schema without storing anything
pub async fn validate(
    State(server): State<ConfigraServer>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    server.service.validate(&request.schema, &request.config)?;
    Ok(Json(json!({ "status": "valid" })))
}

/// Validate and store a new version
pub async fn create_config(
    State(server): State<ConfigraServer>,
    scope: ProjectScope,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ConfigVersion>)> {
    let Json(request) = payload?;
    let key = scoped_key(&scope, request.env_id, &request.key)?;

    let created = server
        .service
        .create_config(&key, &request.data, &request.schema, &scope.actor())
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Replay an older version's content as the new head
pub async fn rollback_config(
    State(server): State<ConfigraServer>,
    scope: ProjectScope,
    payload: Result<Json<RollbackRequest>, JsonRejection>,
) -> ApiResult<Json<ConfigVersion>> {
    let Json(request) = payload?;
    if request.target_version == 0 {
        return Err(missing_fields());
    }
    let key = scoped_key(&scope, request.env_id, &request.key)?;

    let restored = server
        .service
        .rollback_config(&key, request.target_version, &scope.actor())
        .await?;

    Ok(Json(restored))
}

/// Latest version of one configuration
pub async fn get_config(
    State(server): State<ConfigraServer>,
    scope: ProjectScope,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> ApiResult<Json<ConfigVersion>> {
    let Query(query) = query?;
    let key = scoped_key(&scope, query.env_id, &query.key)?;

    server
        .service
        .get_config(&key)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&key))
}

/// Full history, or a single version when `version` is given
pub async fn list_versions(
    State(server): State<ConfigraServer>,
    scope: ProjectScope,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ConfigVersion>>> {
    let Query(query) = query?;
    let key = scoped_key(&scope, query.env_id, &query.key)?;

    if let Some(version) = query.version {
        return match server.service.get_version(&key, version).await? {
            Some(found) => Ok(Json(vec![found])),
            None => Err(ApiError::from(DatabaseError::VersionNotFound {
                key: key.key.clone(),
                version,
            })),
        };
    }

    let history = server.service.list_versions(&key).await?;
    if history.is_empty() {
        return Err(not_found(&key));
    }
    Ok(Json(history))
}
